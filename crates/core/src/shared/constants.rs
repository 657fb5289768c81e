pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Optional 68-point landmark model. Has no download source; when it is not
/// in the model cache or the bundled model directory, landmarks fall back to
/// the detector's 5-point keypoints.
pub const LANDMARK_MODEL_NAME: &str = "landmarks_68.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Display downscale applied to every captured frame.
pub const DEFAULT_DISPLAY_SCALE: f64 = 0.6;

/// Per-axis downscale applied before face detection. Independent of the
/// display scale.
pub const DEFAULT_DETECTION_SCALE: f64 = 0.25;

/// Minimum delay between two ticks of the viewer loop.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

pub const DEFAULT_CAMERA_INDEX: u32 = 0;
