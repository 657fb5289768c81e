use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use facecam_core::pipeline::frame_processor::{ProcessingOptions, ProcessorConfig};
use facecam_core::pipeline::processor_factory::EngineSettings;
use facecam_core::recognition::domain::identity_gallery::GalleryError;
use facecam_core::shared::constants::{
    DEFAULT_CAMERA_INDEX, DEFAULT_DETECTION_SCALE, DEFAULT_DISPLAY_SCALE,
    DEFAULT_TICK_INTERVAL_MS,
};
use facecam_core::detection::domain::face_encoder::DEFAULT_MATCH_THRESHOLD;
use facecam_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detect_faces: bool,
    pub detect_landmarks: bool,
    pub camera_index: u32,
    pub gallery_dir: Option<PathBuf>,
    pub tick_interval_ms: u64,
    pub display_scale: f64,
    pub detection_scale: f64,
    pub confidence: f64,
    pub match_threshold: f64,
    pub label_font: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detect_faces: true,
            detect_landmarks: true,
            camera_index: DEFAULT_CAMERA_INDEX,
            gallery_dir: None,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            display_scale: DEFAULT_DISPLAY_SCALE,
            detection_scale: DEFAULT_DETECTION_SCALE,
            confidence: DEFAULT_CONFIDENCE,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            label_font: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceCam").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Missing or malformed files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    log::warn!("Could not save settings to {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("Could not serialize settings: {e}"),
        }
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            display_scale: self.display_scale,
            detection_scale: (self.detection_scale, self.detection_scale),
            match_threshold: self.match_threshold,
        }
    }

    /// A landmark extractor is always requested so the toggle works without
    /// a restart; the toggle only decides whether it runs.
    pub fn engine_settings(&self) -> Result<EngineSettings, GalleryError> {
        if let Some(ref dir) = self.gallery_dir {
            if !dir.is_dir() {
                return Err(GalleryError::Directory {
                    path: dir.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
                });
            }
        }
        Ok(EngineSettings {
            confidence: self.confidence,
            landmarks: true,
            gallery_dir: self.gallery_dir.clone(),
            models_dir: None,
            label_font: self.label_font.clone(),
        })
    }

    pub fn options(&self) -> ProcessingOptions {
        ProcessingOptions {
            detect_faces: self.detect_faces,
            detect_landmarks: self.detect_landmarks,
            recognize_identities: true,
        }
    }
}
