use std::time::{Duration, Instant};

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_encoder::DEFAULT_MATCH_THRESHOLD;
use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::pipeline::annotator;
use crate::pipeline::label_font::LabelFont;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::recognition::domain::identity_gallery::IdentityGallery;
use crate::shared::bounding_box::{BoundingBox, ScaleError, ScaleFactors};
use crate::shared::constants::{DEFAULT_DETECTION_SCALE, DEFAULT_DISPLAY_SCALE};
use crate::shared::frame::Frame;

/// Tunables for [`FrameProcessor`]. Validated by [`FrameProcessor::new`].
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessorConfig {
    /// Uniform downscale from capture to display resolution.
    pub display_scale: f64,
    /// Per-axis `(fx, fy)` downscale from display to detection resolution.
    pub detection_scale: (f64, f64),
    /// Cosine similarity needed for a gallery match.
    pub match_threshold: f64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            display_scale: DEFAULT_DISPLAY_SCALE,
            detection_scale: (DEFAULT_DETECTION_SCALE, DEFAULT_DETECTION_SCALE),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Per-tick feature switches, read from the UI toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessingOptions {
    pub detect_faces: bool,
    /// Only honoured when `detect_faces` is also set.
    pub detect_landmarks: bool,
    pub recognize_identities: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            detect_faces: true,
            detect_landmarks: true,
            recognize_identities: true,
        }
    }
}

/// What was found in one frame, in normalized-frame coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    pub boxes: Vec<BoundingBox>,
    /// One set per box when landmarks ran.
    pub landmarks: Option<Vec<LandmarkSet>>,
    /// One slot per box when recognition ran; `None` slots are unknown faces.
    pub labels: Option<Vec<Option<String>>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameMetrics {
    pub elapsed: Duration,
    /// `None` when the elapsed time is too small to measure.
    pub fps: Option<f64>,
    pub stage_ms: Vec<(&'static str, f64)>,
}

impl FrameMetrics {
    pub fn new(elapsed: Duration, stage_ms: Vec<(&'static str, f64)>) -> Self {
        Self {
            elapsed,
            fps: fps_from_secs(elapsed.as_secs_f64()),
            stage_ms,
        }
    }

    pub fn fps_label(&self) -> String {
        match self.fps {
            Some(fps) => format!("FPS: {fps:.2}"),
            None => "FPS: --".to_string(),
        }
    }
}

/// Frames per second for one frame that took `secs`. Non-positive or
/// non-finite durations have no meaningful rate.
pub fn fps_from_secs(secs: f64) -> Option<f64> {
    if secs.is_finite() && secs > 0.0 {
        Some(1.0 / secs)
    } else {
        None
    }
}

pub type ProcessOutput = (Frame, DetectionResult, FrameMetrics);

/// Turns one raw capture into an annotated display frame.
///
/// The stages are normalize, detect, landmarks, recognize and annotate. Each
/// optional stage is switched by [`ProcessingOptions`] and by whether its
/// engine is configured. A failing engine is logged and treated as having
/// found nothing, so a tick always produces a frame.
pub struct FrameProcessor {
    detector: Box<dyn FaceDetector>,
    landmarks: Option<Box<dyn LandmarkExtractor>>,
    gallery: Option<IdentityGallery>,
    logger: Box<dyn PipelineLogger>,
    label_font: LabelFont,
    display: ScaleFactors,
    detection: ScaleFactors,
}

impl FrameProcessor {
    pub fn new(config: &ProcessorConfig, detector: Box<dyn FaceDetector>) -> Result<Self, ScaleError> {
        let display = ScaleFactors::uniform(config.display_scale)?;
        let (fx, fy) = config.detection_scale;
        let detection = ScaleFactors::new(fx, fy)?;
        Ok(Self {
            detector,
            landmarks: None,
            gallery: None,
            logger: Box::new(NullPipelineLogger),
            label_font: LabelFont::bitmap(),
            display,
            detection,
        })
    }

    pub fn with_landmarks(mut self, extractor: Box<dyn LandmarkExtractor>) -> Self {
        self.landmarks = Some(extractor);
        self
    }

    pub fn with_gallery(mut self, gallery: IdentityGallery) -> Self {
        self.gallery = Some(gallery);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_label_font(mut self, font: LabelFont) -> Self {
        self.label_font = font;
        self
    }

    pub fn label_font(&self) -> &LabelFont {
        &self.label_font
    }

    pub fn has_landmarks(&self) -> bool {
        self.landmarks.is_some()
    }

    pub fn gallery(&self) -> Option<&IdentityGallery> {
        self.gallery.as_ref()
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    pub fn process(&mut self, raw: &Frame, options: ProcessingOptions) -> ProcessOutput {
        let started = Instant::now();
        let mut stages = Vec::with_capacity(5);

        let t = Instant::now();
        let normalized = self.normalize(raw);
        self.record(&mut stages, "normalize", t);

        let mut result = DetectionResult::default();

        if options.detect_faces {
            let t = Instant::now();
            result.boxes = self.detect(&normalized);
            self.record(&mut stages, "detect", t);
            self.logger.metric("faces", result.boxes.len() as f64);
        }

        if !result.boxes.is_empty() {
            if options.detect_landmarks && self.landmarks.is_some() {
                let t = Instant::now();
                result.landmarks = self.extract_landmarks(&normalized, &result.boxes);
                self.record(&mut stages, "landmarks", t);
            }
            if options.recognize_identities && self.gallery.is_some() {
                let t = Instant::now();
                result.labels = self.recognize(&normalized, &result.boxes);
                self.record(&mut stages, "recognize", t);
            }
        }

        let t = Instant::now();
        let annotated = annotator::annotate(normalized, &result, &self.label_font);
        self.record(&mut stages, "annotate", t);

        let metrics = FrameMetrics::new(started.elapsed(), stages);
        (annotated, result, metrics)
    }

    fn normalize(&self, raw: &Frame) -> Frame {
        raw.to_rgb().scaled(self.display.fx(), self.display.fy())
    }

    fn detect(&mut self, normalized: &Frame) -> Vec<BoundingBox> {
        let small = normalized.scaled(self.detection.fx(), self.detection.fy());
        match self.detector.detect(&small) {
            Ok(boxes) => boxes
                .iter()
                .map(|b| {
                    self.detection
                        .rescale_to_full(b)
                        .clamp_to(normalized.width(), normalized.height())
                })
                .filter(|b| b.area() > 0)
                .collect(),
            Err(e) => {
                log::warn!("Face detection failed: {e}");
                Vec::new()
            }
        }
    }

    fn extract_landmarks(
        &mut self,
        normalized: &Frame,
        boxes: &[BoundingBox],
    ) -> Option<Vec<LandmarkSet>> {
        let extractor = self.landmarks.as_mut()?;
        match extractor.extract(normalized, boxes) {
            Ok(sets) if sets.len() == boxes.len() => Some(sets),
            Ok(sets) => {
                log::warn!(
                    "Landmark extractor returned {} sets for {} faces",
                    sets.len(),
                    boxes.len()
                );
                None
            }
            Err(e) => {
                log::warn!("Landmark extraction failed: {e}");
                None
            }
        }
    }

    fn recognize(&mut self, normalized: &Frame, boxes: &[BoundingBox]) -> Option<Vec<Option<String>>> {
        let gallery = self.gallery.as_mut()?;
        let labels = boxes
            .iter()
            .map(|b| match gallery.match_face(normalized, b) {
                Ok(label) => label,
                Err(e) => {
                    log::warn!("Identity match failed: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();
        let matched = labels.iter().filter(|l| l.is_some()).count();
        self.logger.metric("matched", matched as f64);
        Some(labels)
    }

    fn record(&mut self, stages: &mut Vec<(&'static str, f64)>, stage: &'static str, since: Instant) {
        let ms = since.elapsed().as_secs_f64() * 1000.0;
        self.logger.timing(stage, ms);
        stages.push((stage, ms));
    }
}
