/// 68-point facial landmark regressor using ONNX Runtime.
///
/// Each face box is grown to a square with a 10 % margin, cropped, resized to
/// the model input and normalized to [0, 1]. The model emits 136 values: 68
/// `(x, y)` pairs relative to the crop.
use std::path::Path;

use crate::detection::domain::face_landmarks::{LandmarkSet, POINT_COUNT};
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider;

const DEFAULT_INPUT_SIZE: u32 = 112;
const CROP_MARGIN: f64 = 0.1;

pub struct OnnxLandmarkExtractor {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxLandmarkExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = execution_provider::build_session(model_path)?;
        let input_size = execution_provider::input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        log::info!("Landmark extractor ready (input {input_size}px)");
        Ok(Self {
            session,
            input_size,
        })
    }

    fn extract_one(
        &mut self,
        frame: &Frame,
        region: &BoundingBox,
    ) -> Result<LandmarkSet, Box<dyn std::error::Error>> {
        let Some((crop, crop_box)) = square_crop(frame, region) else {
            return Ok(LandmarkSet::new(Vec::new()));
        };
        let tensor = preprocess(&crop.resized(self.input_size, self.input_size));
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let values = outputs[0].try_extract_array::<f32>()?;
        let values = values.as_slice().ok_or("Cannot get landmark slice")?;
        let points = to_frame_points(values, &crop_box)?;
        Ok(LandmarkSet::from_68_points(&points)?)
    }
}

impl LandmarkExtractor for OnnxLandmarkExtractor {
    fn extract(
        &mut self,
        frame: &Frame,
        boxes: &[BoundingBox],
    ) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>> {
        boxes.iter().map(|b| self.extract_one(frame, b)).collect()
    }
}

/// Square crop around `region`, clamped to the frame, plus the box it covers.
fn square_crop(frame: &Frame, region: &BoundingBox) -> Option<(Frame, BoundingBox)> {
    let crop_box = region
        .expanded_square(CROP_MARGIN)
        .clamp_to(frame.width(), frame.height());
    frame.crop(&crop_box).map(|crop| (crop, crop_box))
}

/// HWC u8 → NCHW f32 in [0, 1].
fn preprocess(frame: &Frame) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let (h, w) = (frame.height() as usize, frame.width() as usize);
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, h, w));
    for y in 0..h {
        for x in 0..w {
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[y, x, c]] as f32 / 255.0;
            }
        }
    }
    tensor
}

/// Maps crop-relative `[x0, y0, x1, y1, ...]` onto frame pixel coordinates.
fn to_frame_points(
    values: &[f32],
    crop_box: &BoundingBox,
) -> Result<Vec<(f64, f64)>, Box<dyn std::error::Error>> {
    if values.len() < POINT_COUNT * 2 {
        return Err(format!(
            "landmark model produced {} values, expected {}",
            values.len(),
            POINT_COUNT * 2
        )
        .into());
    }
    let (w, h) = (crop_box.width() as f64, crop_box.height() as f64);
    Ok(values[..POINT_COUNT * 2]
        .chunks_exact(2)
        .map(|p| {
            (
                crop_box.left as f64 + p[0] as f64 * w,
                crop_box.top as f64 + p[1] as f64 * h,
            )
        })
        .collect())
}
