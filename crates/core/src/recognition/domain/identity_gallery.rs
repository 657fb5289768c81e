use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_encoder::{FaceEncoder, FaceEncoding};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("no face detected in reference image '{label}'")]
    NoFaceDetected { label: String },
    #[error("cannot read reference image {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot read reference directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("face engine failed on reference '{label}': {message}")]
    Engine { label: String, message: String },
}

/// One known person: a display label and the encoding of their face.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityRecord {
    pub label: String,
    pub encoding: FaceEncoding,
}

/// Known faces, loaded once at startup and read-only afterwards.
///
/// Matching walks the records in insertion order and returns the first one
/// within the threshold, not the closest one.
pub struct IdentityGallery {
    records: Vec<IdentityRecord>,
    encoder: Box<dyn FaceEncoder>,
    threshold: f64,
}

impl IdentityGallery {
    /// Detects and encodes one face per reference image.
    ///
    /// The first detected face is used when a reference shows several. A
    /// reference with no face aborts the whole build.
    pub fn build(
        references: Vec<(String, Frame)>,
        detector: &mut dyn FaceDetector,
        mut encoder: Box<dyn FaceEncoder>,
        threshold: f64,
    ) -> Result<Self, GalleryError> {
        let mut records = Vec::with_capacity(references.len());

        for (label, frame) in references {
            let frame = frame.to_rgb();
            let engine_err = |e: Box<dyn std::error::Error>| GalleryError::Engine {
                label: label.clone(),
                message: e.to_string(),
            };

            let boxes = detector.detect(&frame).map_err(engine_err)?;
            let Some(first) = boxes.first() else {
                return Err(GalleryError::NoFaceDetected { label });
            };
            if boxes.len() > 1 {
                log::warn!(
                    "Reference '{label}' shows {} faces; using the first",
                    boxes.len()
                );
            }

            let encoding = encoder.encode(&frame, first).map_err(engine_err)?;
            log::debug!("Enrolled '{label}'");
            records.push(IdentityRecord { label, encoding });
        }

        log::info!("Identity gallery loaded with {} records", records.len());
        Ok(Self {
            records,
            encoder,
            threshold,
        })
    }

    /// Label of the first record matching the face inside `region`.
    pub fn match_face(
        &mut self,
        frame: &Frame,
        region: &BoundingBox,
    ) -> Result<Option<String>, Box<dyn std::error::Error>> {
        if self.records.is_empty() {
            return Ok(None);
        }
        let query = self.encoder.encode(frame, region)?;
        Ok(self.match_encoding(&query).map(str::to_owned))
    }

    pub fn match_encoding(&self, query: &FaceEncoding) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.encoding.matches(query, self.threshold))
            .map(|r| r.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn records(&self) -> &[IdentityRecord] {
        &self.records
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}
