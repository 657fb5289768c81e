/// 5-point landmarks taken from the YOLO face model's keypoint head.
///
/// Works with the detector model alone, so landmarks are available without
/// the optional 68-point model. The detector runs on the frame it is given
/// and each requested box takes the keypoints of its best-overlapping
/// detection.
use std::path::Path;

use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::math::bbox_iou;
use super::onnx_yolo_detector::{KeypointDetection, OnnxYoloDetector};

/// A detection must overlap a requested box at least this much to lend it
/// keypoints.
const MIN_MATCH_IOU: f64 = 0.3;

pub struct YoloKeypointExtractor {
    detector: OnnxYoloDetector,
}

impl YoloKeypointExtractor {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let detector = OnnxYoloDetector::new(model_path, confidence)?;
        log::info!("Landmarks use the detector's 5-point keypoints");
        Ok(Self { detector })
    }
}

impl LandmarkExtractor for YoloKeypointExtractor {
    fn extract(
        &mut self,
        frame: &Frame,
        boxes: &[BoundingBox],
    ) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>> {
        if boxes.is_empty() {
            return Ok(Vec::new());
        }
        let detections = self.detector.detect_with_keypoints(frame)?;
        Ok(match_keypoints(boxes, &detections))
    }
}

/// One set per box, in box order. Boxes with no overlapping detection, or
/// whose detection carried no keypoints, get an empty set.
fn match_keypoints(boxes: &[BoundingBox], detections: &[KeypointDetection]) -> Vec<LandmarkSet> {
    boxes
        .iter()
        .map(|b| {
            let target = corners(b);
            detections
                .iter()
                .map(|d| (bbox_iou(&target, &corners(&d.bbox)), d))
                .filter(|(iou, _)| *iou >= MIN_MATCH_IOU)
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .and_then(|(_, d)| d.keypoints.as_ref())
                .map(LandmarkSet::from_5_points)
                .unwrap_or_else(|| LandmarkSet::new(Vec::new()))
        })
        .collect()
}

fn corners(b: &BoundingBox) -> [f64; 4] {
    [b.left as f64, b.top as f64, b.right as f64, b.bottom as f64]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::{FacialFeature, FivePoints};

    fn points_at(x: f64, y: f64) -> FivePoints {
        [
            Some((x - 10.0, y)),
            Some((x + 10.0, y)),
            Some((x, y + 10.0)),
            Some((x - 8.0, y + 20.0)),
            Some((x + 8.0, y + 20.0)),
        ]
    }

    fn detection(bbox: BoundingBox, keypoints: Option<FivePoints>) -> KeypointDetection {
        KeypointDetection { bbox, keypoints }
    }

    #[test]
    fn test_each_box_takes_keypoints_of_its_own_face() {
        let left = BoundingBox::new(10, 60, 70, 0);
        let right = BoundingBox::new(10, 200, 70, 140);
        let detections = [
            detection(BoundingBox::new(12, 202, 72, 142), Some(points_at(170.0, 30.0))),
            detection(BoundingBox::new(8, 58, 68, 2), Some(points_at(30.0, 30.0))),
        ];

        let sets = match_keypoints(&[left, right], &detections);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].feature(FacialFeature::NoseTip).unwrap(), &[(30, 40)]);
        assert_eq!(sets[1].feature(FacialFeature::NoseTip).unwrap(), &[(170, 40)]);
    }

    #[test]
    fn test_unmatched_box_gets_empty_set() {
        let detections = [detection(
            BoundingBox::new(0, 50, 50, 0),
            Some(points_at(25.0, 20.0)),
        )];
        let far = BoundingBox::new(300, 400, 400, 300);
        let sets = match_keypoints(&[far], &detections);
        assert_eq!(sets.len(), 1);
        assert!(sets[0].is_empty());
    }

    #[test]
    fn test_detection_without_keypoints_gives_empty_set() {
        let b = BoundingBox::new(0, 50, 50, 0);
        let sets = match_keypoints(&[b], &[detection(b, None)]);
        assert!(sets[0].is_empty());
    }

    #[test]
    fn test_one_set_per_box_even_without_detections() {
        let boxes = vec![BoundingBox::new(0, 10, 10, 0); 3];
        assert_eq!(match_keypoints(&boxes, &[]).len(), 3);
    }

    #[test]
    fn test_best_overlap_wins() {
        let target = BoundingBox::new(0, 100, 100, 0);
        let detections = [
            detection(BoundingBox::new(20, 120, 120, 20), Some(points_at(70.0, 70.0))),
            detection(BoundingBox::new(2, 100, 100, 2), Some(points_at(50.0, 50.0))),
        ];
        let sets = match_keypoints(&[target], &detections);
        assert_eq!(sets[0].feature(FacialFeature::LeftEye).unwrap(), &[(40, 50)]);
    }
}
