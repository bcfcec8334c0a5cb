//! Small UI helpers: truncation, inner-rect math and mouse hit tests.

use crossterm::event::MouseEvent;
use ratatui::{layout::Rect, text::Span};

pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(n - right).collect();
    format!("{head}...{tail}")
}

/// Area inside a one-cell border.
pub fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

pub fn hit(area: Rect, mouse: &MouseEvent) -> bool {
    mouse.column >= area.x
        && mouse.column < area.x + area.width
        && mouse.row >= area.y
        && mouse.row < area.y + area.height
}

/// Index of the span under `column` when `spans` are drawn starting at `x`.
pub fn span_at(spans: &[Span<'_>], x: u16, column: u16) -> Option<usize> {
    let mut left = x;
    for (i, s) in spans.iter().enumerate() {
        let right = left.saturating_add(s.width() as u16);
        if column >= left && column < right {
            return Some(i);
        }
        left = right;
    }
    None
}

#[cfg(test)]
pub(crate) fn mouse(
    kind: crossterm::event::MouseEventKind,
    column: u16,
    row: u16,
) -> MouseEvent {
    MouseEvent {
        kind,
        column,
        row,
        modifiers: crossterm::event::KeyModifiers::NONE,
    }
}

#[cfg(test)]
pub(crate) fn buffer_lines(buf: &ratatui::buffer::Buffer) -> Vec<String> {
    let area = buf.area;
    let w = area.width as usize;
    buf.content()
        .chunks(w.max(1))
        .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
        .collect()
}
