use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{CaptureError, FrameSource};

/// Decodes an image file into an RGB [`Frame`].
pub fn read_image(path: &Path) -> Result<Frame, image::ImageError> {
    let img = image::open(path)?.to_rgb8();
    Ok(Frame::from_rgb_image(img))
}

/// Replays a single still image as an endless frame source.
///
/// Lets the headless driver and tests run the full tick without a camera.
pub struct ImageFileSource {
    frame: Option<Frame>,
    path: PathBuf,
}

impl ImageFileSource {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let frame = read_image(path).map_err(|source| CaptureError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_frame(frame, path))
    }

    pub fn from_frame(frame: Frame, path: &Path) -> Self {
        Self {
            frame: Some(frame),
            path: path.to_path_buf(),
        }
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        self.frame.clone().ok_or(CaptureError::Released)
    }

    fn release(&mut self) {
        self.frame = None;
    }

    fn describe(&self) -> String {
        format!("image {}", self.path.display())
    }
}
