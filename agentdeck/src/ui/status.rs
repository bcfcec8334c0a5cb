//! Status indicator dot.

use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::types::AgentStatus;
use crate::ui::theme::Tone;

pub const DOT: &str = "●";

pub fn status_tone(status: AgentStatus) -> Tone {
    match status {
        AgentStatus::Healthy => Tone::Success,
        AgentStatus::Degraded => Tone::Warning,
        AgentStatus::Unhealthy => Tone::Error,
        AgentStatus::Unknown => Tone::Neutral,
    }
}

/// Coloured dot for `status`. Blinks only when `animate` is set; callers
/// conventionally pass `status == Healthy`.
pub fn status_dot(status: AgentStatus, animate: bool) -> Span<'static> {
    let mut style = Style::default().fg(status_tone(status).color());
    if animate {
        style = style.add_modifier(Modifier::SLOW_BLINK);
    }
    Span::styled(DOT, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::{ERROR, NEUTRAL, SUCCESS, WARNING};

    #[test]
    fn colour_per_status() {
        let colours: Vec<_> = AgentStatus::ALL
            .iter()
            .map(|s| status_dot(*s, false).style.fg)
            .collect();
        assert_eq!(
            colours,
            vec![Some(SUCCESS), Some(WARNING), Some(ERROR), Some(NEUTRAL)]
        );
    }

    #[test]
    fn blinks_only_when_asked() {
        let still = status_dot(AgentStatus::Healthy, false);
        assert!(!still.style.add_modifier.contains(Modifier::SLOW_BLINK));
        let live = status_dot(AgentStatus::Healthy, true);
        assert!(live.style.add_modifier.contains(Modifier::SLOW_BLINK));
        assert_eq!(live.content, DOT);
    }
}
