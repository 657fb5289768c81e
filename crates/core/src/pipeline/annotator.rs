use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::pipeline::frame_processor::DetectionResult;
use crate::pipeline::label_font::LabelFont;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::{Frame, PixelFormat};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LANDMARK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const LABEL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const BOX_THICKNESS: u32 = 2;
const LANDMARK_RADIUS: i32 = 2;
/// Gap between the bottom of a label and the top edge of its box.
const LABEL_GAP: i32 = 4;

/// Burns detection overlays into an RGB frame.
///
/// A result with no boxes leaves the frame untouched, byte for byte.
pub fn annotate(frame: Frame, result: &DetectionResult, font: &LabelFont) -> Frame {
    if result.boxes.is_empty() {
        return frame;
    }

    let (width, height) = (frame.width(), frame.height());
    let Some(mut img) = RgbImage::from_raw(width, height, frame.to_rgb().into_data()) else {
        return frame;
    };

    for b in &result.boxes {
        draw_box(&mut img, b);
    }

    if let Some(ref landmarks) = result.landmarks {
        for set in landmarks {
            for (x, y) in set.flattened() {
                draw_filled_circle_mut(&mut img, (x, y), LANDMARK_RADIUS, LANDMARK_COLOR);
            }
        }
    }

    if let Some(ref labels) = result.labels {
        for (b, label) in result.boxes.iter().zip(labels) {
            if let Some(text) = label {
                draw_label(&mut img, b, text, font);
            }
        }
    }

    Frame::new(img.into_raw(), width, height, PixelFormat::Rgb)
}

fn draw_box(img: &mut RgbImage, b: &BoundingBox) {
    for inset in 0..BOX_THICKNESS as i32 {
        let w = b.width() - 2 * inset;
        let h = b.height() - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(b.left + inset, b.top + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(img, rect, BOX_COLOR);
    }
}

/// Top-left corner for a label centred above `b`, kept inside the image.
pub fn label_origin(b: &BoundingBox, text: &str, font: &LabelFont, img_width: u32) -> (i32, i32) {
    let (tw, th) = font.text_size(text);
    let max_x = (img_width as i32 - tw as i32).max(0);
    let x = (b.center_x() - tw as i32 / 2).clamp(0, max_x);
    let y = (b.top - LABEL_GAP - th as i32).max(0);
    (x, y)
}

fn draw_label(img: &mut RgbImage, b: &BoundingBox, text: &str, font: &LabelFont) {
    let (x, y) = label_origin(b, text, font, img.width());
    font.draw(img, x, y, text, LABEL_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::{FacialFeature, LandmarkSet};

    fn count(frame: &Frame, color: Rgb<u8>) -> usize {
        frame
            .data()
            .chunks_exact(3)
            .filter(|px| *px == color.0.as_slice())
            .count()
    }

    fn bitmap() -> LabelFont {
        LabelFont::bitmap()
    }

    fn result(boxes: Vec<BoundingBox>) -> DetectionResult {
        DetectionResult {
            boxes,
            landmarks: None,
            labels: None,
        }
    }

    #[test]
    fn test_no_boxes_is_byte_identical() {
        let frame = Frame::filled(64, 48, [10, 20, 30]);
        let out = annotate(frame.clone(), &result(Vec::new()), &bitmap());
        assert_eq!(out, frame);
    }

    #[test]
    fn test_box_outline_is_two_pixels_thick() {
        let frame = Frame::filled(100, 100, [0, 0, 0]);
        let out = annotate(frame, &result(vec![BoundingBox::new(10, 60, 50, 20)]), &bitmap());
        let px = |x: usize, y: usize| &out.data()[(y * 100 + x) * 3..(y * 100 + x) * 3 + 3];
        assert_eq!(px(20, 30), &[0, 255, 0]);
        assert_eq!(px(21, 30), &[0, 255, 0]);
        assert_eq!(px(22, 30), &[0, 0, 0]);
        assert_eq!(px(40, 30), &[0, 0, 0]);
        // 40x40 outer ring plus 38x38 inner ring
        assert_eq!(count(&out, BOX_COLOR), (4 * 40 - 4) + (4 * 38 - 4));
    }

    #[test]
    fn test_landmarks_drawn_in_red() {
        let frame = Frame::filled(100, 100, [0, 0, 0]);
        let mut r = result(vec![BoundingBox::new(10, 90, 90, 10)]);
        r.landmarks = Some(vec![LandmarkSet::new(vec![(
            FacialFeature::NoseTip,
            vec![(50, 50)],
        )])]);
        let out = annotate(frame, &r, &bitmap());
        assert_eq!(&out.data()[(50 * 100 + 50) * 3..(50 * 100 + 50) * 3 + 3], &[255, 0, 0]);
        assert!(count(&out, LANDMARK_COLOR) >= 9);
    }

    #[test]
    fn test_label_is_centred_above_box() {
        let b = BoundingBox::new(100, 300, 200, 200);
        let (x, y) = label_origin(&b, "AB", &bitmap(), 640);
        // "AB" at scale 2 is 14x10
        assert_eq!(x, 250 - 7);
        assert_eq!(y, 100 - 4 - 10);
    }

    #[test]
    fn test_label_is_clamped_into_frame() {
        let near_top_left = BoundingBox::new(2, 10, 40, 0);
        assert_eq!(label_origin(&near_top_left, "LONG NAME", &bitmap(), 640), (0, 0));

        let near_right = BoundingBox::new(50, 640, 90, 600);
        let (x, _) = label_origin(&near_right, "LONG NAME", &bitmap(), 640);
        let (tw, _) = bitmap().text_size("LONG NAME");
        assert_eq!(x, 640 - tw as i32);
    }

    #[test]
    fn test_label_pixels_land_above_box() {
        let frame = Frame::filled(200, 200, [0, 0, 0]);
        let mut r = result(vec![BoundingBox::new(100, 150, 180, 50)]);
        r.labels = Some(vec![Some("ANN".to_string())]);
        let out = annotate(frame, &r, &bitmap());
        let above = out.data()[..100 * 200 * 3]
            .chunks_exact(3)
            .filter(|px| *px == LABEL_COLOR.0.as_slice())
            .count();
        assert!(above > 0);
    }

    #[test]
    fn test_missing_label_slot_draws_nothing_above() {
        let frame = Frame::filled(200, 200, [0, 0, 0]);
        let mut r = result(vec![BoundingBox::new(100, 150, 180, 50)]);
        r.labels = Some(vec![None]);
        let out = annotate(frame, &r, &bitmap());
        assert!(out.data()[..100 * 200 * 3].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_truetype_labels_keep_accented_names_apart() {
        let font = LabelFont::load(None);
        if !font.is_truetype() {
            eprintln!("no system font installed; skipping");
            return;
        }
        let draw = |name: &str| {
            let mut r = result(vec![BoundingBox::new(100, 150, 180, 50)]);
            r.labels = Some(vec![Some(name.to_string())]);
            annotate(Frame::filled(200, 200, [0, 0, 0]), &r, &font)
        };
        let zoe_diaeresis = draw("Zoë");
        let zoe_acute = draw("Zoé");
        assert_ne!(zoe_diaeresis, zoe_acute);
        // Glyphs land above the box, not over it
        assert!(zoe_acute.data()[..100 * 200 * 3].iter().any(|&b| b != 0));
    }

    #[test]
    fn test_bgr_input_is_converted() {
        let frame = Frame::new(vec![30, 20, 10].repeat(16 * 16), 16, 16, PixelFormat::Bgr);
        let out = annotate(frame, &result(vec![BoundingBox::new(4, 12, 12, 4)]), &bitmap());
        assert_eq!(out.format(), PixelFormat::Rgb);
        assert_eq!(&out.data()[..3], &[10, 20, 30]);
    }
}
