//! Log viewer control bar: follow/pause toggles with change observers,
//! clear/copy/download callback slots, and the level/line-cap selectors.

use std::fmt;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::types::LogLevel;
use crate::ui::theme::{ACCENT, MUTED, NEUTRAL, SUCCESS, WARNING};
use crate::ui::util::{hit, inner, span_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlChange {
    Following(bool),
    Paused(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Only(LogLevel),
}

impl LevelFilter {
    const CYCLE: [LevelFilter; 5] = [
        LevelFilter::All,
        LevelFilter::Only(LogLevel::Info),
        LevelFilter::Only(LogLevel::Warn),
        LevelFilter::Only(LogLevel::Error),
        LevelFilter::Only(LogLevel::Debug),
    ];

    pub fn next(self) -> Self {
        let i = Self::CYCLE.iter().position(|l| *l == self).unwrap_or(0);
        Self::CYCLE[(i + 1) % Self::CYCLE.len()]
    }

    pub fn admits(self, level: LogLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(l) => l == level,
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelFilter::All => f.write_str("all"),
            LevelFilter::Only(l) => f.write_str(l.as_str()),
        }
    }
}

pub const LINE_CAPS: [usize; 4] = [100, 500, 1000, 5000];

/// The clickable parts of the control bar, each bound to one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlButton {
    Follow,
    Pause,
    Level,
    Lines,
    Clear,
    Copy,
    Download,
}

impl ControlButton {
    pub const ALL: [ControlButton; 7] = [
        ControlButton::Follow,
        ControlButton::Pause,
        ControlButton::Level,
        ControlButton::Lines,
        ControlButton::Clear,
        ControlButton::Copy,
        ControlButton::Download,
    ];

    pub fn key(self) -> char {
        match self {
            ControlButton::Follow => 'f',
            ControlButton::Pause => 'p',
            ControlButton::Level => 'L',
            ControlButton::Lines => 'N',
            ControlButton::Clear => 'C',
            ControlButton::Copy => 'Y',
            ControlButton::Download => 'S',
        }
    }

    pub fn from_key(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }
}

type Observer = Box<dyn FnMut(ControlChange)>;
type Callback = Box<dyn FnMut()>;

pub struct StreamControls {
    is_following: bool,
    is_paused: bool,
    level_filter: LevelFilter,
    line_cap_idx: usize,
    observers: Vec<Observer>,
    on_clear: Option<Callback>,
    on_copy: Option<Callback>,
    on_download: Option<Callback>,
}

impl Default for StreamControls {
    fn default() -> Self {
        Self {
            is_following: true,
            is_paused: false,
            level_filter: LevelFilter::All,
            line_cap_idx: 1,
            observers: Vec::new(),
            on_clear: None,
            on_copy: None,
            on_download: None,
        }
    }
}

impl fmt::Debug for StreamControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamControls")
            .field("is_following", &self.is_following)
            .field("is_paused", &self.is_paused)
            .field("level_filter", &self.level_filter)
            .field("line_cap", &self.line_cap())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl StreamControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_following(&self) -> bool {
        self.is_following
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.level_filter
    }

    pub fn line_cap(&self) -> usize {
        LINE_CAPS[self.line_cap_idx]
    }

    /// Register an observer, called once for every toggle.
    pub fn subscribe(&mut self, observer: impl FnMut(ControlChange) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn on_clear(&mut self, cb: impl FnMut() + 'static) {
        self.on_clear = Some(Box::new(cb));
    }

    pub fn on_copy(&mut self, cb: impl FnMut() + 'static) {
        self.on_copy = Some(Box::new(cb));
    }

    pub fn on_download(&mut self, cb: impl FnMut() + 'static) {
        self.on_download = Some(Box::new(cb));
    }

    fn publish(&mut self, change: ControlChange) {
        for obs in self.observers.iter_mut() {
            obs(change);
        }
    }

    pub fn toggle_following(&mut self) {
        self.is_following = !self.is_following;
        self.publish(ControlChange::Following(self.is_following));
    }

    pub fn toggle_paused(&mut self) {
        self.is_paused = !self.is_paused;
        self.publish(ControlChange::Paused(self.is_paused));
    }

    pub fn clear(&mut self) {
        if let Some(cb) = self.on_clear.as_mut() {
            cb();
        }
    }

    pub fn copy(&mut self) {
        if let Some(cb) = self.on_copy.as_mut() {
            cb();
        }
    }

    pub fn download(&mut self) {
        if let Some(cb) = self.on_download.as_mut() {
            cb();
        }
    }

    // Selectors only change the selected value; the owner decides what they mean.
    pub fn cycle_level_filter(&mut self) {
        self.level_filter = self.level_filter.next();
    }

    pub fn cycle_line_cap(&mut self) {
        self.line_cap_idx = (self.line_cap_idx + 1) % LINE_CAPS.len();
    }
}

fn toggle_span(label: &str, on: bool, on_color: ratatui::style::Color) -> Span<'static> {
    let (mark, style) = if on {
        ("■", Style::default().fg(on_color).add_modifier(Modifier::BOLD))
    } else {
        ("□", Style::default().fg(NEUTRAL))
    };
    Span::styled(format!("{mark} {label}"), style)
}

// Spans of the control bar, each tagged with the button it belongs to.
fn control_spans(c: &StreamControls) -> Vec<(Option<ControlButton>, Span<'static>)> {
    let key = |b: ControlButton| {
        (
            Some(b),
            Span::styled(format!("[{}]", b.key()), Style::default().fg(ACCENT)),
        )
    };
    let text = |b: ControlButton, s: String| (Some(b), Span::raw(s));
    let gap = |s: &'static str| (None::<ControlButton>, Span::raw(s));
    vec![
        key(ControlButton::Follow),
        (
            Some(ControlButton::Follow),
            toggle_span("follow", c.is_following(), SUCCESS),
        ),
        gap("  "),
        key(ControlButton::Pause),
        (
            Some(ControlButton::Pause),
            toggle_span("pause", c.is_paused(), WARNING),
        ),
        gap("  "),
        key(ControlButton::Level),
        text(ControlButton::Level, format!("level: {}", c.level_filter())),
        gap("  "),
        key(ControlButton::Lines),
        text(ControlButton::Lines, format!("lines: {}", c.line_cap())),
        (None, Span::styled("  │  ", Style::default().fg(MUTED))),
        key(ControlButton::Clear),
        text(ControlButton::Clear, "lear".into()),
        gap(" "),
        key(ControlButton::Copy),
        text(ControlButton::Copy, " copy".into()),
        gap(" "),
        key(ControlButton::Download),
        text(ControlButton::Download, " download".into()),
    ]
}

pub fn control_line(c: &StreamControls) -> Line<'static> {
    Line::from(
        control_spans(c)
            .into_iter()
            .map(|(_, span)| span)
            .collect::<Vec<_>>(),
    )
}

/// Button under a left click inside the bar drawn at `area`.
pub fn controls_handle_mouse(
    c: &StreamControls,
    mouse: MouseEvent,
    area: Rect,
) -> Option<ControlButton> {
    if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
        return None;
    }
    let body = inner(area);
    if body.height == 0 || mouse.row != body.y || !hit(body, &mouse) {
        return None;
    }
    let (owners, spans): (Vec<_>, Vec<_>) = control_spans(c).into_iter().unzip();
    span_at(&spans, body.x, mouse.column).and_then(|i| owners[i])
}

pub fn draw_controls(f: &mut ratatui::Frame<'_>, area: Rect, c: &StreamControls) {
    f.render_widget(
        Paragraph::new(control_line(c))
            .block(Block::default().borders(Borders::ALL).title("Stream")),
        area,
    );
}
