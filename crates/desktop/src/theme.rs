use iced::color;
use iced::theme::Palette;
use iced::Theme;

/// Dark palette; the video pane reads best on a dark surround.
pub fn viewer_theme() -> Theme {
    Theme::custom("FaceCam", dark_palette())
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x1c, 0x1c, 0x1e),
        text: color!(0xcc, 0xcc, 0xcc),
        primary: color!(0x30, 0xd1, 0x58),
        success: color!(0x30, 0xd1, 0x58),
        warning: color!(0xff, 0xcc, 0x00),
        danger: color!(0xff, 0x45, 0x3a),
    }
}
