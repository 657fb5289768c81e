pub mod reference_directory;
