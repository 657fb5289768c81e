use std::fs;
use std::path::{Path, PathBuf};

use crate::recognition::domain::identity_gallery::GalleryError;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::infrastructure::image_file_source::read_image;

/// Reads a flat directory of reference photos as `(label, frame)` pairs.
///
/// Only files with a known image extension are read. Entries are sorted by
/// file name so gallery insertion order is stable; the label is the stem.
pub fn load(dir: &Path) -> Result<Vec<(String, Frame)>, GalleryError> {
    let paths = image_paths(dir)?;
    let mut references = Vec::with_capacity(paths.len());
    for path in paths {
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let frame = read_image(&path).map_err(|source| GalleryError::Unreadable {
            path: path.clone(),
            source,
        })?;
        log::debug!("Read reference '{label}' from {}", path.display());
        references.push((label, frame));
    }
    Ok(references)
}

fn image_paths(dir: &Path) -> Result<Vec<PathBuf>, GalleryError> {
    let dir_err = |source| GalleryError::Directory {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, rgb: [u8; 3]) {
        let mut img = image::RgbImage::new(4, 4);
        for px in img.pixels_mut() {
            *px = image::Rgb(rgb);
        }
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_load_sorts_by_file_name_and_uses_stems() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "zoe.png", [1, 1, 1]);
        write_png(tmp.path(), "adam.png", [2, 2, 2]);
        write_png(tmp.path(), "maria.png", [3, 3, 3]);

        let refs = load(tmp.path()).unwrap();
        let labels: Vec<&str> = refs.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["adam", "maria", "zoe"]);
        assert_eq!(&refs[0].1.data()[..3], &[2, 2, 2]);
    }

    #[test]
    fn test_load_skips_non_images_and_subdirectories() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "ann.png", [1, 1, 1]);
        fs::write(tmp.path().join("notes.txt"), b"hello").unwrap();
        fs::create_dir(tmp.path().join("nested.png")).unwrap();

        let refs = load(tmp.path()).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].0, "ann");
    }

    #[test]
    fn test_load_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(load(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_directory_is_directory_error() {
        let err = load(Path::new("/nonexistent/references")).unwrap_err();
        assert!(matches!(err, GalleryError::Directory { .. }));
    }

    #[test]
    fn test_load_corrupt_image_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.jpg"), b"not a jpeg").unwrap();
        let err = load(tmp.path()).unwrap_err();
        match err {
            GalleryError::Unreadable { path, .. } => {
                assert_eq!(path.file_name().unwrap(), "broken.jpg")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case("a.jpg", true)]
    #[case("a.JPEG", true)]
    #[case("a.png", true)]
    #[case("a.webp", true)]
    #[case("a.txt", false)]
    #[case("noext", false)]
    fn test_has_image_extension(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(has_image_extension(Path::new(name)), expected);
    }
}
