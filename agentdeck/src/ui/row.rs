//! Agent table: one dense row per agent, with row actions shown on the
//! hovered row only.

use std::rc::Rc;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table},
};

use crate::intent::{AgentAction, Intent, Route};
use crate::types::{Agent, AgentStatus};
use crate::ui::status::status_dot;
use crate::ui::theme::{ACCENT, MUTED};
use crate::ui::util::{hit, inner, span_at, truncate_middle};

/// Three-way status used for the row indicator. Distinct from the card
/// badge: unknown narrows to unhealthy here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl From<AgentStatus> for DisplayStatus {
    fn from(s: AgentStatus) -> Self {
        match s {
            AgentStatus::Healthy => DisplayStatus::Healthy,
            AgentStatus::Degraded => DisplayStatus::Degraded,
            AgentStatus::Unhealthy | AgentStatus::Unknown => DisplayStatus::Unhealthy,
        }
    }
}

impl DisplayStatus {
    fn indicator_status(self) -> AgentStatus {
        match self {
            DisplayStatus::Healthy => AgentStatus::Healthy,
            DisplayStatus::Degraded => AgentStatus::Degraded,
            DisplayStatus::Unhealthy => AgentStatus::Unhealthy,
        }
    }
}

pub const ROW_ACTIONS: [AgentAction; 2] = [AgentAction::Refresh, AgentAction::Delete];

// Shared by drawing and mouse hit tests so widths line up.
const COLS: [Constraint; 7] = [
    Constraint::Length(2),      // indicator
    Constraint::Percentage(22), // name
    Constraint::Percentage(24), // endpoint
    Constraint::Length(9),      // version
    Constraint::Length(9),      // containers
    Constraint::Length(8),      // uptime
    Constraint::Min(20),        // link / actions
];

const COL_SPACING: u16 = 1;
const TRAILING_COL: usize = 6;

// Column rects on the first line of `content`, split the way the table does.
fn column_rects(content: Rect) -> Rc<[Rect]> {
    Layout::horizontal(COLS)
        .flex(Flex::Legacy)
        .spacing(COL_SPACING)
        .split(Rect {
            height: 1,
            ..content
        })
}

fn action_hints() -> Vec<Span<'static>> {
    ROW_ACTIONS
        .iter()
        .flat_map(|a| {
            [
                Span::styled(a.hint(), Style::default().fg(ACCENT)),
                Span::raw(" "),
            ]
        })
        .collect()
}

pub fn detail_route(agent: &Agent) -> Route {
    Route::AgentDetail(agent.id.clone())
}

pub fn agent_row(agent: &Agent, hovered: bool) -> Row<'static> {
    let display = DisplayStatus::from(agent.status);
    let indicator = status_dot(
        display.indicator_status(),
        display == DisplayStatus::Healthy,
    );

    let trailing = if hovered {
        Line::from(action_hints())
    } else {
        Line::from(Span::styled(
            detail_route(agent).href(),
            Style::default()
                .fg(MUTED)
                .add_modifier(Modifier::UNDERLINED),
        ))
    };

    let style = if hovered {
        Style::default().bg(Color::Rgb(40, 44, 52))
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(Line::from(indicator)),
        Cell::from(agent.name.clone()),
        Cell::from(truncate_middle(&agent.endpoint, 28)).style(Style::default().fg(MUTED)),
        Cell::from(agent.version.clone()),
        Cell::from(format!("{}/{}", agent.running_count, agent.container_count)),
        Cell::from(agent.uptime.clone()),
        Cell::from(trailing),
    ])
    .style(style)
}

/// Enter navigates to the detail route; row action keys dispatch.
pub fn dispatch_row_key(agent: &Agent, key: char, dispatch: &mut impl FnMut(Intent)) -> bool {
    if key == '\n' {
        dispatch(Intent::Navigate(detail_route(agent)));
        return true;
    }
    match ROW_ACTIONS.iter().find(|a| a.key() == key) {
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

pub fn draw_agent_table(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    agents: &[Agent],
    hovered: Option<usize>,
    scroll_offset: usize,
) {
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Agents ({})", agents.len())),
        area,
    );
    let content = inner(area);
    if content.height < 2 || content.width < 10 {
        return;
    }

    let viewport = content.height.saturating_sub(1) as usize;
    let offset = scroll_offset.min(agents.len().saturating_sub(viewport));
    let rows = agents
        .iter()
        .enumerate()
        .skip(offset)
        .take(viewport)
        .map(|(i, a)| agent_row(a, hovered == Some(i)));

    let header = Row::new(vec!["", "Name", "Endpoint", "Version", "Running", "Uptime", ""])
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    let table = Table::new(rows, COLS.to_vec())
        .header(header)
        .flex(Flex::Legacy)
        .column_spacing(COL_SPACING);
    f.render_widget(table, content);
}

/// Pointer handling for a table drawn at `area`. Returns the row under the
/// pointer, which becomes the hovered row. A left click on a hovered row's
/// action hint dispatches that action; elsewhere on a row it opens the
/// agent's detail route.
pub fn row_handle_mouse(
    agents: &[Agent],
    hovered: Option<usize>,
    scroll_offset: usize,
    mouse: MouseEvent,
    area: Rect,
    dispatch: &mut impl FnMut(Intent),
) -> Option<usize> {
    let content = inner(area);
    if content.height < 2 || content.width < 10 || !hit(content, &mouse) {
        return None;
    }
    // First content line is the header
    if mouse.row == content.y {
        return None;
    }
    let viewport = content.height.saturating_sub(1) as usize;
    let offset = scroll_offset.min(agents.len().saturating_sub(viewport));
    let idx = offset + (mouse.row - content.y - 1) as usize;
    let agent = agents.get(idx)?;

    if matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
        let trailing = column_rects(content)[TRAILING_COL];
        let action = match span_at(&action_hints(), trailing.x, mouse.column) {
            Some(i) if hovered == Some(idx) && i % 2 == 0 => ROW_ACTIONS.get(i / 2),
            _ => None,
        };
        match action {
            Some(action) => dispatch(Intent::Agent {
                id: agent.id.clone(),
                action: *action,
            }),
            None => dispatch(Intent::Navigate(detail_route(agent))),
        }
    }
    Some(idx)
}
