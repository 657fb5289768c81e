use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for facial landmark extraction.
///
/// `boxes` are location hints in `frame` coordinates. Implementations return
/// exactly one [`LandmarkSet`] per box, in the same order.
pub trait LandmarkExtractor {
    fn extract(
        &mut self,
        frame: &Frame,
        boxes: &[BoundingBox],
    ) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>>;
}
