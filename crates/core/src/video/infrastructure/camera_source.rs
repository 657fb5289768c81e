use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use crate::shared::frame::{Frame, PixelFormat};
use crate::video::domain::frame_source::{CaptureError, FrameSource};

/// Webcam capture through `nokhwa`, decoded to RGB.
///
/// The stream is opened once in [`CameraSource::open`] and stays open until
/// [`FrameSource::release`] or drop.
pub struct CameraSource {
    camera: Option<Camera>,
    index: u32,
    name: String,
}

impl CameraSource {
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let unavailable = |reason: String| CaptureError::DeviceUnavailable { index, reason };

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| unavailable(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| unavailable(e.to_string()))?;

        let name = camera.info().human_name();
        log::info!(
            "Opened camera {index}: {name} ({})",
            camera.camera_format()
        );

        Ok(Self {
            camera: Some(camera),
            index,
            name,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let camera = self.camera.as_mut().ok_or(CaptureError::Released)?;
        let buffer = camera
            .frame()
            .map_err(|e| CaptureError::NoFrameAvailable(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::NoFrameAvailable(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());
        Ok(Frame::new(decoded.into_raw(), width, height, PixelFormat::Rgb))
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera {}: {e}", self.index);
            }
            log::info!("Released camera {}", self.index);
        }
    }

    fn describe(&self) -> String {
        format!("camera {} ({})", self.index, self.name)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}
