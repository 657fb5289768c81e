//! Facial landmarks grouped by feature region.
//!
//! Uses the 68-point iBUG layout: jaw 0-16, eyebrows 17-26, nose 27-35,
//! eyes 36-47, lips 48-67. The lip groups share their corner points, so the
//! flattened sequence holds more than 68 entries.

use std::ops::Range;

/// Number of points produced by a 68-point landmark model.
pub const POINT_COUNT: usize = 68;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FacialFeature {
    Chin,
    LeftEyebrow,
    RightEyebrow,
    NoseBridge,
    NoseTip,
    LeftEye,
    RightEye,
    TopLip,
    BottomLip,
}

impl FacialFeature {
    pub const ALL: &[FacialFeature] = &[
        FacialFeature::Chin,
        FacialFeature::LeftEyebrow,
        FacialFeature::RightEyebrow,
        FacialFeature::NoseBridge,
        FacialFeature::NoseTip,
        FacialFeature::LeftEye,
        FacialFeature::RightEye,
        FacialFeature::TopLip,
        FacialFeature::BottomLip,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FacialFeature::Chin => "chin",
            FacialFeature::LeftEyebrow => "left_eyebrow",
            FacialFeature::RightEyebrow => "right_eyebrow",
            FacialFeature::NoseBridge => "nose_bridge",
            FacialFeature::NoseTip => "nose_tip",
            FacialFeature::LeftEye => "left_eye",
            FacialFeature::RightEye => "right_eye",
            FacialFeature::TopLip => "top_lip",
            FacialFeature::BottomLip => "bottom_lip",
        }
    }

    /// Indices into the 68-point layout, in drawing order.
    fn indices(self) -> Vec<usize> {
        let span = |r: Range<usize>| r.collect::<Vec<_>>();
        match self {
            FacialFeature::Chin => span(0..17),
            FacialFeature::LeftEyebrow => span(17..22),
            FacialFeature::RightEyebrow => span(22..27),
            FacialFeature::NoseBridge => span(27..31),
            FacialFeature::NoseTip => span(31..36),
            FacialFeature::LeftEye => span(36..42),
            FacialFeature::RightEye => span(42..48),
            FacialFeature::TopLip => {
                let mut v = span(48..55);
                v.extend([64, 63, 62, 61, 60]);
                v
            }
            FacialFeature::BottomLip => {
                let mut v = span(54..60);
                v.extend([48, 60, 67, 66, 65, 64]);
                v
            }
        }
    }
}

/// Keypoints from a 5-point face model, in the order left eye, right eye,
/// nose tip, left mouth corner, right mouth corner. `None` marks a point the
/// model could not see.
pub type FivePoints = [Option<(f64, f64)>; 5];

/// Landmarks for one detected face, grouped by [`FacialFeature`].
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    groups: Vec<(FacialFeature, Vec<(i32, i32)>)>,
}

impl LandmarkSet {
    pub fn new(groups: Vec<(FacialFeature, Vec<(i32, i32)>)>) -> Self {
        Self { groups }
    }

    /// Groups raw 68-point model output into feature regions.
    pub fn from_68_points(points: &[(f64, f64)]) -> Result<Self, &'static str> {
        if points.len() != POINT_COUNT {
            return Err("expected exactly 68 landmark points");
        }
        let groups = FacialFeature::ALL
            .iter()
            .map(|&feature| {
                let pts = feature
                    .indices()
                    .into_iter()
                    .map(|i| (points[i].0.round() as i32, points[i].1.round() as i32))
                    .collect();
                (feature, pts)
            })
            .collect();
        Ok(Self { groups })
    }

    /// Sparse set from 5-point keypoints. Both lip groups hold the two mouth
    /// corners; invisible points are left out.
    pub fn from_5_points(points: &FivePoints) -> Self {
        let pick = |idx: &[usize]| -> Vec<(i32, i32)> {
            idx.iter()
                .filter_map(|&i| points[i])
                .map(|(x, y)| (x.round() as i32, y.round() as i32))
                .collect()
        };
        Self {
            groups: vec![
                (FacialFeature::LeftEye, pick(&[0])),
                (FacialFeature::RightEye, pick(&[1])),
                (FacialFeature::NoseTip, pick(&[2])),
                (FacialFeature::TopLip, pick(&[3, 4])),
                (FacialFeature::BottomLip, pick(&[4, 3])),
            ],
        }
    }

    pub fn groups(&self) -> &[(FacialFeature, Vec<(i32, i32)>)] {
        &self.groups
    }

    pub fn feature(&self, feature: FacialFeature) -> Option<&[(i32, i32)]> {
        self.groups
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, pts)| pts.as_slice())
    }

    /// Every point in feature order, as one sequence for drawing.
    pub fn flattened(&self) -> Vec<(i32, i32)> {
        self.groups
            .iter()
            .flat_map(|(_, pts)| pts.iter().copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, pts)| pts.is_empty())
    }
}
