//! Agent card: identity, status badge, and a layout that depends on whether
//! the agent is operational or disconnected.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::intent::{AgentAction, Intent};
use crate::types::{Agent, AgentStatus};
use crate::ui::status::status_dot;
use crate::ui::theme::{Tone, ACCENT, MUTED, WARNING};
use crate::ui::util::{hit, inner, span_at, truncate_middle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

/// Card badge. Unhealthy and unknown both read as disconnected here.
pub fn card_badge(status: AgentStatus) -> Badge {
    match status {
        AgentStatus::Healthy => Badge {
            label: "HEALTHY",
            tone: Tone::Success,
        },
        AgentStatus::Degraded => Badge {
            label: "DEGRADED",
            tone: Tone::Warning,
        },
        AgentStatus::Unhealthy | AgentStatus::Unknown => Badge {
            label: "DISCONNECTED",
            tone: Tone::Error,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardLayout {
    Operational { degraded: bool },
    Disconnected,
}

pub fn card_layout(status: AgentStatus) -> CardLayout {
    match status {
        AgentStatus::Healthy => CardLayout::Operational { degraded: false },
        AgentStatus::Degraded => CardLayout::Operational { degraded: true },
        AgentStatus::Unhealthy | AgentStatus::Unknown => CardLayout::Disconnected,
    }
}

const OPERATIONAL_ACTIONS: [AgentAction; 5] = [
    AgentAction::View,
    AgentAction::Logs,
    AgentAction::HealthCheck,
    AgentAction::Edit,
    AgentAction::Delete,
];

const DISCONNECTED_ACTIONS: [AgentAction; 3] = [
    AgentAction::Reconnect,
    AgentAction::Logs,
    AgentAction::Remove,
];

pub fn card_actions(layout: CardLayout) -> &'static [AgentAction] {
    match layout {
        CardLayout::Operational { .. } => &OPERATIONAL_ACTIONS,
        CardLayout::Disconnected => &DISCONNECTED_ACTIONS,
    }
}

/// Forward the toolbar action bound to `key` (if any) for `agent`.
/// Returns whether the key was consumed.
pub fn dispatch_card_key(agent: &Agent, key: char, dispatch: &mut impl FnMut(Intent)) -> bool {
    let layout = card_layout(agent.status);
    match card_actions(layout).iter().find(|a| a.key() == key) {
        Some(action) => {
            dispatch(Intent::Agent {
                id: agent.id.clone(),
                action: *action,
            });
            true
        }
        None => false,
    }
}

fn metric_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<9}"), Style::default().fg(MUTED)),
        Span::raw(value),
    ])
}

fn toolbar_line(actions: &[AgentAction]) -> Line<'static> {
    let mut spans = Vec::with_capacity(actions.len() * 2);
    for (i, a) in actions.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(a.hint(), Style::default().fg(ACCENT)));
    }
    Line::from(spans)
}

/// Body lines below the title, already branched on status.
pub fn card_lines(agent: &Agent) -> Vec<Line<'static>> {
    let layout = card_layout(agent.status);
    let mut lines = Vec::new();
    lines.push(Line::from(Span::styled(
        agent.endpoint.clone(),
        Style::default().fg(MUTED),
    )));

    match layout {
        CardLayout::Operational { degraded } => {
            lines.push(metric_line("uptime", agent.uptime.clone()));
            lines.push(metric_line(
                "running",
                format!("{} / {}", agent.running_count, agent.container_count),
            ));
            if let Some(cpu) = &agent.cpu {
                lines.push(metric_line("cpu", cpu.clone()));
            }
            if let Some(mem) = &agent.memory {
                lines.push(metric_line("memory", mem.clone()));
            }
            if let Some(disk) = &agent.disk {
                lines.push(metric_line("disk", disk.clone()));
            }
            if degraded {
                lines.push(Line::from(Span::styled(
                    "! Degraded: some containers are not running",
                    Style::default().fg(WARNING),
                )));
            }
        }
        CardLayout::Disconnected => {
            lines.push(Line::from(Span::styled(
                format!("! Agent unreachable. Last seen {}", agent.last_seen),
                Style::default().fg(WARNING),
            )));
        }
    }

    lines.push(Line::default());
    lines.push(toolbar_line(card_actions(layout)));
    lines
}

/// Toolbar action under the pointer for a card drawn at `area`.
pub fn card_action_at(agent: &Agent, area: Rect, mouse: &MouseEvent) -> Option<AgentAction> {
    let body = inner(area);
    let lines = card_lines(agent);
    let toolbar_row = body.y + lines.len() as u16 - 1;
    if toolbar_row != mouse.row || !hit(body, mouse) {
        return None;
    }
    let actions = card_actions(card_layout(agent.status));
    let toolbar = toolbar_line(actions);
    // Hints sit at even span indices, separators in between
    match span_at(&toolbar.spans, body.x, mouse.column)? {
        i if i % 2 == 0 => actions.get(i / 2).copied(),
        _ => None,
    }
}

/// Forward the toolbar action under a left click. Returns whether one fired.
pub fn card_handle_mouse(
    agent: &Agent,
    area: Rect,
    mouse: MouseEvent,
    dispatch: &mut impl FnMut(Intent),
) -> bool {
    if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
        return false;
    }
    match card_action_at(agent, area, &mouse) {
        Some(action) => {
            dispatch(Intent::Agent {
                id: agent.id.clone(),
                action,
            });
            true
        }
        None => false,
    }
}

fn card_title(agent: &Agent, width: u16) -> Line<'static> {
    let badge = card_badge(agent.status);
    let name_max = (width as usize).saturating_sub(badge.label.len() + 10);
    Line::from(vec![
        Span::raw(" "),
        status_dot(agent.status, agent.status == AgentStatus::Healthy),
        Span::raw(" "),
        Span::styled(
            truncate_middle(&agent.name, name_max),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", badge.label),
            Style::default()
                .fg(badge.tone.color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ])
}

/// Rows a card needs, borders included.
pub fn card_height(agent: &Agent) -> u16 {
    card_lines(agent).len() as u16 + 2
}

pub fn draw_agent_card(f: &mut ratatui::Frame<'_>, area: Rect, agent: &Agent, focused: bool) {
    let border = if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default()
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(card_title(agent, area.width));
    if !agent.version.is_empty() {
        block = block.title_bottom(Line::from(format!(" v{} ", agent.version)).right_aligned());
    }
    f.render_widget(block, area);

    let body = inner(area);
    if body.height == 0 || body.width == 0 {
        return;
    }
    f.render_widget(Paragraph::new(card_lines(agent)), body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::util::{buffer_lines, mouse};
    use ratatui::{backend::TestBackend, Terminal};

    fn agent(status: AgentStatus) -> Agent {
        Agent {
            id: "a1".into(),
            name: "edge-1".into(),
            endpoint: "10.0.0.4:7000".into(),
            status,
            container_count: 5,
            running_count: 2,
            cpu: None,
            memory: None,
            disk: None,
            uptime: "3d".into(),
            last_seen: "5m ago".into(),
            version: "1.4.2".into(),
        }
    }

    fn text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn badge_and_branch_for_every_status() {
        let expected = [
            (
                AgentStatus::Healthy,
                "HEALTHY",
                Tone::Success,
                CardLayout::Operational { degraded: false },
            ),
            (
                AgentStatus::Degraded,
                "DEGRADED",
                Tone::Warning,
                CardLayout::Operational { degraded: true },
            ),
            (
                AgentStatus::Unhealthy,
                "DISCONNECTED",
                Tone::Error,
                CardLayout::Disconnected,
            ),
            (
                AgentStatus::Unknown,
                "DISCONNECTED",
                Tone::Error,
                CardLayout::Disconnected,
            ),
        ];
        for (status, label, tone, layout) in expected {
            let b = card_badge(status);
            assert_eq!((b.label, b.tone), (label, tone), "{status:?}");
            assert_eq!(card_layout(status), layout, "{status:?}");
        }
    }

    #[test]
    fn degraded_warning_only_when_degraded() {
        let healthy = text(&card_lines(&agent(AgentStatus::Healthy)));
        let degraded = text(&card_lines(&agent(AgentStatus::Degraded)));
        assert!(!healthy.contains("Degraded:"));
        assert!(degraded.contains("Degraded:"));
        assert!(!healthy.contains("unreachable"));
    }

    #[test]
    fn degraded_example_shows_counters_and_no_metrics() {
        let body = text(&card_lines(&agent(AgentStatus::Degraded)));
        assert!(body.contains("2 / 5"));
        assert!(body.contains("3d"));
        assert!(!body.contains("cpu"));
        assert!(!body.contains("memory"));
    }

    #[test]
    fn optional_metrics_render_iff_present() {
        let mut a = agent(AgentStatus::Healthy);
        a.cpu = Some("12%".into());
        let body = text(&card_lines(&a));
        assert!(body.contains("cpu") && body.contains("12%"));
        assert!(!body.contains("memory"));

        a.cpu = None;
        a.memory = Some("1.2 GiB".into());
        let body = text(&card_lines(&a));
        assert!(!body.contains("cpu"));
        assert!(body.contains("memory") && body.contains("1.2 GiB"));
    }

    #[test]
    fn disconnected_shows_last_seen_and_reduced_toolbar() {
        for status in [AgentStatus::Unhealthy, AgentStatus::Unknown] {
            let body = text(&card_lines(&agent(status)));
            assert!(body.contains("Last seen 5m ago"));
            assert!(!body.contains("uptime"));
            assert!(body.contains("reconnect") && body.contains("remove"));
            assert!(!body.contains("[e]dit"));
        }
    }

    #[test]
    fn keys_dispatch_only_actions_in_the_current_toolbar() {
        let mut seen = Vec::new();
        let healthy = agent(AgentStatus::Healthy);
        assert!(dispatch_card_key(&healthy, 'h', &mut |i| seen.push(i)));
        assert!(!dispatch_card_key(&healthy, 'c', &mut |i| seen.push(i)));

        let down = agent(AgentStatus::Unhealthy);
        assert!(dispatch_card_key(&down, 'c', &mut |i| seen.push(i)));
        assert!(!dispatch_card_key(&down, 'e', &mut |i| seen.push(i)));

        assert_eq!(
            seen,
            vec![
                Intent::Agent { id: "a1".into(), action: AgentAction::HealthCheck },
                Intent::Agent { id: "a1".into(), action: AgentAction::Reconnect },
            ]
        );
    }

    #[test]
    fn renders_badge_into_the_border() {
        let a = agent(AgentStatus::Degraded);
        let mut term = Terminal::new(TestBackend::new(60, card_height(&a))).unwrap();
        term.draw(|f| draw_agent_card(f, f.area(), &a, true)).unwrap();
        let rows = buffer_lines(term.backend().buffer());
        assert!(rows[0].contains("edge-1"));
        assert!(rows[0].contains("[DEGRADED]"));
        assert!(rows.iter().any(|r| r.contains("2 / 5")));
    }

    #[test]
    fn clicking_a_toolbar_hint_forwards_its_action() {
        let click = |a: &Agent, needle: &str| {
            let lines = card_lines(a);
            let toolbar: String = lines[lines.len() - 1]
                .spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect();
            let column = 1 + toolbar.find(needle).unwrap() as u16;
            let area = Rect::new(0, 0, 60, card_height(a));
            let row = card_height(a) - 2;
            let mut seen = Vec::new();
            let m = mouse(MouseEventKind::Down(MouseButton::Left), column, row);
            card_handle_mouse(a, area, m, &mut |i| seen.push(i));
            seen
        };

        let healthy = agent(AgentStatus::Healthy);
        assert_eq!(
            click(&healthy, "[h]"),
            vec![Intent::Agent { id: "a1".into(), action: AgentAction::HealthCheck }]
        );
        assert_eq!(
            click(&healthy, "[d]elete"),
            vec![Intent::Agent { id: "a1".into(), action: AgentAction::Delete }]
        );
        let down = agent(AgentStatus::Unknown);
        assert_eq!(
            click(&down, "[x]"),
            vec![Intent::Agent { id: "a1".into(), action: AgentAction::Remove }]
        );
    }

    #[test]
    fn clicks_off_the_toolbar_fire_nothing() {
        let a = agent(AgentStatus::Healthy);
        let area = Rect::new(0, 0, 60, card_height(&a));
        let toolbar_row = card_height(&a) - 2;
        let mut seen = Vec::new();
        // endpoint line, separator gap, and a hover over a hint
        for (kind, column, row) in [
            (MouseEventKind::Down(MouseButton::Left), 2, 1),
            (MouseEventKind::Down(MouseButton::Left), 7, toolbar_row),
            (MouseEventKind::Moved, 2, toolbar_row),
        ] {
            let m = mouse(kind, column, row);
            assert!(!card_handle_mouse(&a, area, m, &mut |i| seen.push(i)));
        }
        assert!(seen.is_empty());
    }
}
