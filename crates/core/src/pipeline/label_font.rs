//! Text rendering for identity labels.
//!
//! Labels are file stems, so they can carry any Unicode the file system
//! allows. A TrueType font draws them faithfully; the built-in bitmap font is
//! only used when no font file can be found.

use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::pipeline::glyphs;

/// Pixel height of TrueType labels.
pub const TRUETYPE_LABEL_PX: f32 = 20.0;

/// Cell scale of bitmap labels.
pub const BITMAP_LABEL_SCALE: u32 = 2;

/// Common locations of a sans-serif font with wide Latin coverage.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

pub enum LabelFont {
    TrueType { font: FontVec, scale: PxScale },
    Bitmap { scale: u32 },
}

impl LabelFont {
    /// Tries `preferred` first, then the usual system font locations, and
    /// falls back to the bitmap font.
    pub fn load(preferred: Option<&Path>) -> Self {
        if let Some(path) = preferred {
            match Self::from_file(path) {
                Some(font) => return font,
                None => log::warn!("Cannot use label font {}", path.display()),
            }
        }
        for candidate in SYSTEM_FONT_PATHS {
            if let Some(font) = Self::from_file(Path::new(candidate)) {
                return font;
            }
        }
        log::warn!("No TrueType font found; labels use the built-in bitmap font");
        Self::bitmap()
    }

    /// `None` when the file is missing or is not a parseable font.
    pub fn from_file(path: &Path) -> Option<Self> {
        let data = fs::read(path).ok()?;
        let font = FontVec::try_from_vec(data).ok()?;
        log::info!("Label font loaded from {}", path.display());
        Some(Self::TrueType {
            font,
            scale: PxScale::from(TRUETYPE_LABEL_PX),
        })
    }

    pub fn bitmap() -> Self {
        Self::Bitmap {
            scale: BITMAP_LABEL_SCALE,
        }
    }

    pub fn is_truetype(&self) -> bool {
        matches!(self, Self::TrueType { .. })
    }

    /// Width and line height of `text`.
    pub fn text_size(&self, text: &str) -> (u32, u32) {
        match self {
            Self::TrueType { font, scale } => {
                let (width, _) = text_size(*scale, font, text);
                let scaled = font.as_scaled(*scale);
                let height = (scaled.ascent() - scaled.descent()).ceil().max(0.0) as u32;
                (width, height)
            }
            Self::Bitmap { scale } => glyphs::text_size(text, *scale),
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`, clipped to the image.
    pub fn draw(&self, img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        match self {
            Self::TrueType { font, scale } => draw_text_mut(img, color, x, y, *scale, font, text),
            Self::Bitmap { scale } => glyphs::draw_text(img, x, y, text, color, *scale),
        }
    }
}

impl Default for LabelFont {
    fn default() -> Self {
        Self::bitmap()
    }
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrueType { scale, .. } => write!(f, "LabelFont::TrueType({}px)", scale.y),
            Self::Bitmap { scale } => write!(f, "LabelFont::Bitmap(x{scale})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

    fn system_font() -> Option<LabelFont> {
        SYSTEM_FONT_PATHS
            .iter()
            .find_map(|p| LabelFont::from_file(Path::new(p)))
    }

    fn render(font: &LabelFont, text: &str) -> RgbImage {
        let mut img = RgbImage::new(120, 40);
        font.draw(&mut img, 4, 4, text, GREEN);
        img
    }

    #[test]
    fn test_missing_file_is_not_a_font() {
        assert!(LabelFont::from_file(Path::new("/nonexistent/font.ttf")).is_none());
    }

    #[test]
    fn test_garbage_file_is_not_a_font() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.ttf");
        fs::write(&path, b"definitely not a font").unwrap();
        assert!(LabelFont::from_file(&path).is_none());
    }

    #[test]
    fn test_bitmap_matches_glyph_metrics() {
        let font = LabelFont::bitmap();
        assert!(!font.is_truetype());
        assert_eq!(font.text_size("AB"), (14, 10));
    }

    #[test]
    fn test_bitmap_draws_pixels() {
        let img = render(&LabelFont::bitmap(), "ANN");
        assert!(img.pixels().any(|p| *p == GREEN));
    }

    #[test]
    fn test_truetype_keeps_accents_distinct() {
        let Some(font) = system_font() else {
            eprintln!("no system font installed; skipping");
            return;
        };
        assert!(font.is_truetype());
        assert_ne!(render(&font, "Zoë"), render(&font, "Zoé"));
        assert_ne!(render(&font, "Chloé"), render(&font, "Chlo&"));
    }

    #[test]
    fn test_truetype_keeps_case() {
        let Some(font) = system_font() else {
            eprintln!("no system font installed; skipping");
            return;
        };
        assert_ne!(render(&font, "bob"), render(&font, "BOB"));
    }

    #[test]
    fn test_truetype_size_grows_with_text() {
        let Some(font) = system_font() else {
            eprintln!("no system font installed; skipping");
            return;
        };
        let (short_w, short_h) = font.text_size("Al");
        let (long_w, long_h) = font.text_size("Alexandra");
        assert!(long_w > short_w);
        assert_eq!(short_h, long_h);
        assert!(short_h >= TRUETYPE_LABEL_PX as u32 - 2);
    }

    #[test]
    fn test_load_prefers_given_font_file() {
        let Some(path) = SYSTEM_FONT_PATHS.iter().map(Path::new).find(|p| p.exists()) else {
            eprintln!("no system font installed; skipping");
            return;
        };
        assert!(LabelFont::load(Some(path)).is_truetype());
    }
}
