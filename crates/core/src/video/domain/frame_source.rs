use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// The device could not be opened. Fatal: no frame can ever be produced.
    #[error("capture device {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },
    /// A still image could not be read or decoded. Fatal for that file.
    #[error("cannot read image {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The device produced no data this cycle.
    #[error("no frame available: {0}")]
    NoFrameAvailable(String),
    #[error("capture device already released")]
    Released,
}

/// A live (or replayed) source of frames, polled once per tick.
///
/// The source owns its device handle for its whole lifetime; only the
/// processing tick reads from it.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Releases the underlying device. Safe to call more than once.
    fn release(&mut self);

    /// Human-readable description for logs and window titles.
    fn describe(&self) -> String {
        String::from("frame source")
    }
}
