//! Top header with the feed name, per-status counts and the last feed error.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::types::{Agent, AgentStatus};
use crate::ui::status::status_dot;
use crate::ui::theme::ERROR;

pub fn status_counts(agents: &[Agent]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for a in agents {
        let i = AgentStatus::ALL
            .iter()
            .position(|s| *s == a.status)
            .unwrap_or(3);
        counts[i] += 1;
    }
    counts
}

pub fn draw_header(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    source: &str,
    agents: Option<&[Agent]>,
    feed_error: Option<&str>,
) {
    let mut spans = vec![Span::raw(format!("agentdeck — {source}"))];
    match agents {
        Some(list) => {
            spans.push(Span::raw(" |"));
            for (status, n) in AgentStatus::ALL.iter().zip(status_counts(list)) {
                spans.push(Span::raw(" "));
                spans.push(status_dot(*status, false));
                spans.push(Span::raw(format!(" {n}")));
            }
        }
        None => spans.push(Span::raw(" | loading...")),
    }
    if let Some(err) = feed_error {
        spans.push(Span::styled(
            format!(" | feed error: {err}"),
            Style::default().fg(ERROR),
        ));
    }
    spans.push(Span::raw("  (Tab: view, q: quit)"));
    f.render_widget(
        Block::default()
            .title(Line::from(spans))
            .borders(Borders::BOTTOM),
        area,
    );
}
