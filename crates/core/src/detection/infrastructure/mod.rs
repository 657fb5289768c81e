pub mod execution_provider;
pub mod math;
pub mod onnx_face_encoder;
pub mod onnx_landmark_extractor;
pub mod onnx_yolo_detector;
pub mod yolo_keypoint_extractor;
