use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Default cosine-similarity threshold for a positive identity match.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.4;

/// Fixed-length identity embedding for one face.
///
/// Always stored L2-normalized, so similarity is a plain dot product.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceEncoding {
    values: Vec<f32>,
}

impl FaceEncoding {
    pub fn new(mut values: Vec<f32>) -> Self {
        l2_normalize(&mut values);
        Self { values }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cosine similarity in [-1, 1]. Mismatched lengths compare as 0.
    pub fn similarity(&self, other: &FaceEncoding) -> f64 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (*a as f64) * (*b as f64))
            .sum()
    }

    pub fn matches(&self, other: &FaceEncoding, threshold: f64) -> bool {
        self.similarity(other) >= threshold
    }
}

/// Computes an identity embedding for the face inside `region`.
pub trait FaceEncoder {
    fn encode(
        &mut self,
        frame: &Frame,
        region: &BoundingBox,
    ) -> Result<FaceEncoding, Box<dyn std::error::Error>>;
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
