//! Log line formatting and the scrolling log pane.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::types::{LogLevel, LogRecord};
use crate::ui::theme::{SB_ARROW, SB_THUMB, SB_TRACK};
use crate::ui::util::inner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStyle {
    pub line: Style,
    pub badge: Style,
}

pub fn level_style(level: LogLevel) -> LevelStyle {
    let (line_fg, line_bg, badge_fg, badge_bg) = match level {
        LogLevel::Info => (Color::Gray, Color::Reset, Color::Black, Color::Blue),
        LogLevel::Warn => (
            Color::Yellow,
            Color::Rgb(40, 34, 10),
            Color::Black,
            Color::Yellow,
        ),
        LogLevel::Error => (
            Color::LightRed,
            Color::Rgb(48, 14, 14),
            Color::White,
            Color::Red,
        ),
        LogLevel::Debug => (Color::DarkGray, Color::Reset, Color::Gray, Color::DarkGray),
    };
    LevelStyle {
        line: Style::default().fg(line_fg).bg(line_bg),
        badge: Style::default()
            .fg(badge_fg)
            .bg(badge_bg)
            .add_modifier(Modifier::BOLD),
    }
}

/// `timestamp LEVEL message`, message untouched.
pub fn log_line(record: &LogRecord) -> Line<'_> {
    let style = level_style(record.level);
    let badge = format!(" {:<5} ", record.level.as_str().to_uppercase());
    Line::from(vec![
        Span::styled(record.timestamp.as_str(), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(badge, style.badge),
        Span::raw(" "),
        Span::raw(record.message.as_str()),
    ])
    .style(style.line)
}

/// Unstyled text of a record, used for copy and download.
pub fn plain_line(record: &LogRecord) -> String {
    format!(
        "{} {} {}",
        record.timestamp,
        record.level.as_str().to_uppercase(),
        record.message
    )
}

/// First visible index for a pane of `viewport` rows. Following pins the
/// view to the tail; otherwise `scroll_offset` counts from the top.
pub fn visible_start(
    total: usize,
    viewport: usize,
    scroll_offset: usize,
    following: bool,
) -> usize {
    let max_off = total.saturating_sub(viewport);
    if following {
        max_off
    } else {
        scroll_offset.min(max_off)
    }
}

pub fn draw_log_view<'a, I>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    records: I,
    scroll_offset: usize,
    following: bool,
) where
    I: IntoIterator<Item = &'a LogRecord>,
    I::IntoIter: ExactSizeIterator,
{
    let records = records.into_iter();
    let total = records.len();
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{title} ({total} lines)")),
        area,
    );

    let inner = inner(area);
    if inner.height < 1 || inner.width < 3 {
        return;
    }
    // reserve the right column for the scrollbar
    let content = Rect {
        width: inner.width.saturating_sub(2),
        ..inner
    };

    let viewport = content.height as usize;
    let offset = visible_start(total, viewport, scroll_offset, following);
    let lines: Vec<Line> = records.skip(offset).take(viewport).map(log_line).collect();
    f.render_widget(Paragraph::new(lines), content);

    let scroll_area = Rect {
        x: inner.x + inner.width.saturating_sub(1),
        y: inner.y,
        width: 1,
        height: inner.height,
    };
    draw_scrollbar(f, scroll_area, total, viewport, offset);
}

fn draw_scrollbar(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    total_rows: usize,
    viewport_rows: usize,
    offset: usize,
) {
    if area.height < 3 {
        return;
    }
    let track = (area.height - 2) as usize;
    let total = total_rows.max(1);
    let view = viewport_rows.clamp(1, total);
    let max_off = total.saturating_sub(view);

    let thumb_len = (track * view).div_ceil(total).max(1).min(track);
    let thumb_top = if max_off == 0 {
        0
    } else {
        ((track - thumb_len) * offset.min(max_off) + max_off / 2) / max_off
    };

    let mut lines: Vec<Line> = Vec::with_capacity(area.height as usize);
    lines.push(Line::from(Span::styled("▲", Style::default().fg(SB_ARROW))));
    for i in 0..track {
        if i >= thumb_top && i < thumb_top + thumb_len {
            lines.push(Line::from(Span::styled("█", Style::default().fg(SB_THUMB))));
        } else {
            lines.push(Line::from(Span::styled("│", Style::default().fg(SB_TRACK))));
        }
    }
    lines.push(Line::from(Span::styled("▼", Style::default().fg(SB_ARROW))));
    f.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::util::buffer_lines;
    use ratatui::{backend::TestBackend, Terminal};

    fn rec(level: LogLevel, message: &str) -> LogRecord {
        LogRecord {
            timestamp: "12:00:01".into(),
            level,
            message: message.into(),
        }
    }

    #[test]
    fn badge_is_uppercased_and_message_verbatim() {
        let msg = "  weird <msg> with  spaces & symbols: {\"k\":1}  ";
        for level in LogLevel::ALL {
            let r = rec(level, msg);
            let line = log_line(&r);
            let badge = line.spans[2].content.trim().to_string();
            assert_eq!(badge, level.as_str().to_uppercase());
            assert_eq!(line.spans[4].content, msg);
            assert_eq!(line.spans[0].content, "12:00:01");
        }
    }

    #[test]
    fn each_level_has_a_distinct_fixed_pairing() {
        let styles: Vec<_> = LogLevel::ALL.iter().map(|l| level_style(*l)).collect();
        for (i, a) in styles.iter().enumerate() {
            for b in styles.iter().skip(i + 1) {
                assert_ne!(a.badge, b.badge);
            }
        }
        let r = rec(LogLevel::Error, "boom");
        assert_eq!(log_line(&r).style, level_style(LogLevel::Error).line);
    }

    #[test]
    fn plain_line_matches_badge_text() {
        let r = rec(LogLevel::Warn, "disk at 91%");
        assert_eq!(plain_line(&r), "12:00:01 WARN disk at 91%");
    }

    #[test]
    fn following_pins_to_tail() {
        assert_eq!(visible_start(100, 10, 0, true), 90);
        assert_eq!(visible_start(100, 10, 5, false), 5);
        assert_eq!(visible_start(100, 10, 500, false), 90);
        assert_eq!(visible_start(3, 10, 2, false), 0);
    }

    #[test]
    fn renders_most_recent_last() {
        let logs: Vec<LogRecord> = (0..20)
            .map(|i| rec(LogLevel::Info, &format!("line {i:02}")))
            .collect();
        let mut term = Terminal::new(TestBackend::new(50, 7)).unwrap();
        term.draw(|f| draw_log_view(f, f.area(), "Logs", logs.iter(), 0, true))
            .unwrap();
        let rows = buffer_lines(term.backend().buffer());
        assert!(rows[0].contains("Logs (20 lines)"));
        assert!(rows[1].contains("line 15"));
        assert!(rows[5].contains("line 19"));
    }
}
