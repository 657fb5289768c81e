pub mod annotator;
pub mod frame_processor;
pub mod glyphs;
pub mod label_font;
pub mod pipeline_logger;
pub mod processor_factory;
pub mod viewer_session;
