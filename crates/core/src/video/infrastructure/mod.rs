pub mod camera_source;
pub mod image_file_source;
pub mod image_file_writer;
