use iced::Color;

use crate::core::confirm::ButtonTone;
use crate::core::notice::NoticeLevel;

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::from_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

// ── Background colors ──
pub const BG_PRIMARY: Color = rgb(0x0c, 0x0f, 0x1a);
pub const BG_SECONDARY: Color = rgb(0x14, 0x18, 0x29);
pub const BG_TERTIARY: Color = rgb(0x1c, 0x20, 0x39);
pub const BG_HOVER: Color = rgb(0x25, 0x2a, 0x45);

// ── Border colors ──
pub const BORDER: Color = rgb(0x2a, 0x2f, 0x4a);

// ── Text colors ──
pub const TEXT_PRIMARY: Color = rgb(0xe8, 0xea, 0xf0);
pub const TEXT_SECONDARY: Color = rgb(0x9d, 0xa3, 0xb8);
pub const TEXT_MUTED: Color = rgb(0x6b, 0x71, 0x94);

// ── Accent ──
pub const ACCENT: Color = rgb(0x63, 0x66, 0xf1);
pub const ACCENT_HOVER: Color = rgb(0x81, 0x8c, 0xf8);

// ── Semantic ──
pub const SUCCESS: Color = rgb(0x22, 0xc5, 0x5e);
pub const WARNING: Color = rgb(0xf5, 0x9e, 0x0b);
pub const ERROR: Color = rgb(0xef, 0x44, 0x44);
pub const INFO: Color = rgb(0x3b, 0x82, 0xf6);
pub const DISABLED: Color = rgb(0x4b, 0x50, 0x66);

pub fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Success => SUCCESS,
        NoticeLevel::Info => INFO,
        NoticeLevel::Warning => WARNING,
        NoticeLevel::Error => ERROR,
    }
}

pub fn button_tone_color(tone: ButtonTone) -> Color {
    match tone {
        ButtonTone::Primary => ACCENT,
        ButtonTone::Warning => WARNING,
        ButtonTone::Busy => DISABLED,
    }
}

/// Badge color for an ingestion channel.
pub fn source_color(source: &str) -> Color {
    match source {
        "webhook" => Color { a: 0.8, ..SUCCESS },
        "history_sync" => Color { a: 0.8, ..INFO },
        "history_manual" => Color { a: 0.8, ..ACCENT },
        _ => BG_TERTIARY,
    }
}

pub fn with_alpha(color: Color, alpha: f32) -> Color {
    Color { a: alpha, ..color }
}
