//! Shared UI theme constants.

use ratatui::style::Color;

// Scrollbar colors
pub const SB_ARROW: Color = Color::Rgb(170, 170, 180);
pub const SB_TRACK: Color = Color::Rgb(170, 170, 180);
pub const SB_THUMB: Color = Color::Rgb(170, 170, 180);

// Semantic tones shared by badges and indicators
pub const SUCCESS: Color = Color::Green;
pub const WARNING: Color = Color::Yellow;
pub const ERROR: Color = Color::Red;
pub const NEUTRAL: Color = Color::DarkGray;

pub const MUTED: Color = Color::Gray;
pub const ACCENT: Color = Color::Cyan;

/// Badge/indicator tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Error,
    Neutral,
}

impl Tone {
    pub fn color(self) -> Color {
        match self {
            Tone::Success => SUCCESS,
            Tone::Warning => WARNING,
            Tone::Error => ERROR,
            Tone::Neutral => NEUTRAL,
        }
    }
}
