use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{ArrayView3, ArrayViewMut3};

use crate::shared::bounding_box::BoundingBox;

/// Channel order of a three-channel frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Bgr,
}

/// A single captured or decoded frame: contiguous bytes in row-major order.
///
/// Capture devices may hand over BGR data; everything downstream of
/// [`Frame::to_rgb`] assumes RGB.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * 3,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Solid-colour RGB frame, mostly useful for tests and placeholders.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 3)
            .collect();
        Self::new(data, width, height, PixelFormat::Rgb)
    }

    pub fn from_rgb_image(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, PixelFormat::Rgb)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        3
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Owned RGB copy of this frame, swapping channels if needed.
    pub fn to_rgb(&self) -> Frame {
        match self.format {
            PixelFormat::Rgb => self.clone(),
            PixelFormat::Bgr => {
                let mut data = self.data.clone();
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                Frame::new(data, self.width, self.height, PixelFormat::Rgb)
            }
        }
    }

    /// Bilinear resize to exact dimensions. Keeps the pixel format.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let img = self.to_image_buffer();
        let out = imageops::resize(&img, width.max(1), height.max(1), FilterType::Triangle);
        let (w, h) = out.dimensions();
        Frame::new(out.into_raw(), w, h, self.format)
    }

    /// Resize by per-axis factors; dimensions are truncated and never below 1.
    pub fn scaled(&self, fx: f64, fy: f64) -> Frame {
        let w = ((self.width as f64 * fx) as u32).max(1);
        let h = ((self.height as f64 * fy) as u32).max(1);
        self.resized(w, h)
    }

    /// Copy of the pixels inside `bbox`, clamped to the frame.
    ///
    /// Returns `None` when the clamped box is empty.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let b = bbox.clamp_to(self.width, self.height);
        if b.width() <= 0 || b.height() <= 0 {
            return None;
        }
        let (x1, y1) = (b.left as usize, b.top as usize);
        let (x2, y2) = (b.right as usize, b.bottom as usize);
        let stride = self.width as usize * 3;

        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * 3);
        for row in y1..y2 {
            let start = row * stride + x1 * 3;
            data.extend_from_slice(&self.data[start..start + (x2 - x1) * 3]);
        }
        Some(Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.format,
        ))
    }

    /// Owned copy as an `image` buffer, for drawing and resizing.
    pub fn to_image_buffer(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, PixelFormat::Rgb);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.format(), PixelFormat::Rgb);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, PixelFormat::Rgb);
    }

    #[test]
    fn test_filled_sets_every_pixel() {
        let frame = Frame::filled(3, 2, [10, 20, 30]);
        assert_eq!(frame.data().len(), 18);
        for px in frame.data().chunks_exact(3) {
            assert_eq!(px, &[10, 20, 30]);
        }
    }

    #[test]
    fn test_to_rgb_swaps_bgr() {
        let frame = Frame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, PixelFormat::Bgr);
        let rgb = frame.to_rgb();
        assert_eq!(rgb.format(), PixelFormat::Rgb);
        assert_eq!(rgb.data(), &[3, 2, 1, 6, 5, 4]);
        // source untouched
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_to_rgb_on_rgb_is_copy() {
        let frame = Frame::filled(2, 2, [9, 8, 7]);
        assert_eq!(frame.to_rgb(), frame);
    }

    #[test]
    fn test_scaled_truncates_dimensions() {
        let frame = Frame::filled(640, 480, [0, 0, 0]);
        let small = frame.scaled(0.6, 0.6);
        assert_eq!((small.width(), small.height()), (384, 288));
        let quarter = small.scaled(0.25, 0.25);
        assert_eq!((quarter.width(), quarter.height()), (96, 72));
    }

    #[test]
    fn test_scaled_never_zero() {
        let frame = Frame::filled(3, 3, [0, 0, 0]);
        let tiny = frame.scaled(0.1, 0.1);
        assert_eq!((tiny.width(), tiny.height()), (1, 1));
    }

    #[test]
    fn test_crop_copies_region() {
        // 3x2 frame, pixel value encodes column
        let data = vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 0, 0, 0, 1, 1, 1, 2, 2, 2];
        let frame = Frame::new(data, 3, 2, PixelFormat::Rgb);
        let crop = frame.crop(&BoundingBox::new(0, 3, 2, 1)).unwrap();
        assert_eq!((crop.width(), crop.height()), (2, 2));
        assert_eq!(crop.data(), &[1, 1, 1, 2, 2, 2, 1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_crop_clamps_and_rejects_empty() {
        let frame = Frame::filled(10, 10, [5, 5, 5]);
        let clamped = frame.crop(&BoundingBox::new(-5, 20, 4, 8)).unwrap();
        assert_eq!((clamped.width(), clamped.height()), (2, 4));
        assert!(frame.crop(&BoundingBox::new(20, 30, 25, 22)).is_none());
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        let mut data = vec![0u8; 12];
        data[6] = 255; // row=1, col=0, R
        let frame = Frame::new(data, 2, 2, PixelFormat::Rgb);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }
}
