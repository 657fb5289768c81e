use std::path::{Path, PathBuf};

use crate::detection::infrastructure::onnx_face_encoder::OnnxFaceEncoder;
use crate::detection::infrastructure::onnx_landmark_extractor::OnnxLandmarkExtractor;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::detection::infrastructure::onnx_yolo_detector::{OnnxYoloDetector, DEFAULT_CONFIDENCE};
use crate::detection::infrastructure::yolo_keypoint_extractor::YoloKeypointExtractor;
use crate::pipeline::frame_processor::{FrameProcessor, ProcessorConfig};
use crate::pipeline::label_font::LabelFont;
use crate::recognition::domain::identity_gallery::IdentityGallery;
use crate::recognition::infrastructure::reference_directory;
use crate::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, LANDMARK_MODEL_NAME, YOLO_MODEL_NAME,
    YOLO_MODEL_URL,
};
use crate::shared::model_resolver::{self, ModelResolveError, ProgressFn};

/// Download progress reporter: `(model_name, bytes_downloaded, total_bytes)`.
pub type DownloadProgress = fn(&str, u64, u64);

/// Which engines to load and where to find their inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    pub confidence: f64,
    /// Load a landmark extractor: the 68-point model when installed, the
    /// detector's 5-point keypoints otherwise.
    pub landmarks: bool,
    /// Reference photos for identity matching. `None` disables recognition.
    pub gallery_dir: Option<PathBuf>,
    /// Directory searched after the user cache for pre-installed models.
    pub models_dir: Option<PathBuf>,
    /// TrueType font for identity labels. System fonts are tried when unset.
    pub label_font: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            landmarks: true,
            gallery_dir: None,
            models_dir: None,
            label_font: None,
        }
    }
}

/// Resolves the ONNX models and wires a [`FrameProcessor`] around them.
///
/// Fails on anything that should stop startup: an invalid scale, a detector
/// or encoder model that cannot be fetched, or an unusable reference
/// directory. Landmarks never stop startup.
pub fn create_processor(
    config: &ProcessorConfig,
    settings: &EngineSettings,
    progress: Option<DownloadProgress>,
) -> Result<FrameProcessor, Box<dyn std::error::Error>> {
    let bundled = settings.models_dir.as_deref();

    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let yolo_path = model_resolver::resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        bundled,
        reporter(YOLO_MODEL_NAME, progress),
    )?;
    let mut detector = OnnxYoloDetector::new(&yolo_path, settings.confidence)?;

    let gallery = match settings.gallery_dir {
        Some(ref dir) => Some(load_gallery(
            dir,
            &mut detector,
            config.match_threshold,
            bundled,
            progress,
        )?),
        None => None,
    };

    let mut processor = FrameProcessor::new(config, Box::new(detector))?
        .with_label_font(LabelFont::load(settings.label_font.as_deref()));

    if settings.landmarks {
        match load_landmarks(bundled, &yolo_path, settings.confidence) {
            Ok(extractor) => processor = processor.with_landmarks(extractor),
            Err(e) => log::warn!("Landmark detection disabled: {e}"),
        }
    }

    if let Some(gallery) = gallery {
        processor = processor.with_gallery(gallery);
    }

    Ok(processor)
}

fn load_gallery(
    dir: &Path,
    detector: &mut OnnxYoloDetector,
    threshold: f64,
    bundled: Option<&Path>,
    progress: Option<DownloadProgress>,
) -> Result<IdentityGallery, Box<dyn std::error::Error>> {
    log::info!("Loading reference faces from {}", dir.display());
    let references = reference_directory::load(dir)?;

    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let encoder_path = model_resolver::resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        bundled,
        reporter(EMBEDDING_MODEL_NAME, progress),
    )?;
    let encoder = OnnxFaceEncoder::new(&encoder_path)?;

    Ok(IdentityGallery::build(
        references,
        detector,
        Box::new(encoder),
        threshold,
    )?)
}

/// Where landmarks come from.
#[derive(Debug, PartialEq)]
enum LandmarkSource {
    /// The installed 68-point model.
    Dense(PathBuf),
    /// The detector's own 5-point keypoints.
    DetectorKeypoints,
}

fn landmark_source(located: Result<PathBuf, ModelResolveError>) -> LandmarkSource {
    match located {
        Ok(path) => LandmarkSource::Dense(path),
        Err(e) => {
            log::info!("68-point landmarks unavailable ({e}); using detector keypoints");
            LandmarkSource::DetectorKeypoints
        }
    }
}

fn load_landmarks(
    bundled: Option<&Path>,
    yolo_path: &Path,
    confidence: f64,
) -> Result<Box<dyn LandmarkExtractor>, Box<dyn std::error::Error>> {
    if let LandmarkSource::Dense(path) =
        landmark_source(model_resolver::locate(LANDMARK_MODEL_NAME, bundled))
    {
        match OnnxLandmarkExtractor::new(&path) {
            Ok(extractor) => return Ok(Box::new(extractor)),
            Err(e) => log::warn!("Cannot load {}: {e}; using detector keypoints", path.display()),
        }
    }
    Ok(Box::new(YoloKeypointExtractor::new(yolo_path, confidence)?))
}

fn reporter(name: &'static str, progress: Option<DownloadProgress>) -> Option<ProgressFn> {
    progress.map(|report| -> ProgressFn { Box::new(move |done, total| report(name, done, total)) })
}
