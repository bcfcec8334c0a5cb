//! App state and main loop: input handling, feed polling, intent dispatch, and drawing.

use std::{
    cell::RefCell,
    io,
    path::{Path, PathBuf},
    rc::Rc,
    time::{Duration, Instant},
};

use anyhow::Context;
use chrono::Local;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::clipboard::Clipboard;
use crate::feed::{Feed, FeedError, FeedUpdate};
use crate::history::LogHistory;
use crate::intent::{AgentAction, Intent, Route, StreamAction};
use crate::types::{Agent, LogRecord};
use crate::ui::card::{card_handle_mouse, card_height, dispatch_card_key, draw_agent_card};
use crate::ui::controls::{
    controls_handle_mouse, draw_controls, ControlButton, ControlChange, StreamControls,
};
use crate::ui::header::draw_header;
use crate::ui::log_line::{draw_log_view, plain_line};
use crate::ui::row::{dispatch_row_key, draw_agent_table, row_handle_mouse};
use crate::ui::theme::MUTED;
use crate::ui::util::hit;

const TICK: Duration = Duration::from_millis(100);
const PAGE: usize = 10;
const WHEEL_STEP: isize = 3;
const LOG_PANE_TITLE: &str = "Fleet logs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    #[default]
    Cards,
    Table,
}

// What the control bar's observers and callbacks hand back to the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlEvent {
    Changed(ControlChange),
    Requested(StreamAction),
}

type ControlEvents = Rc<RefCell<Vec<ControlEvent>>>;

// Where the last frame put each interactive part, for mouse hit tests.
#[derive(Debug, Clone, Copy, Default)]
struct HitAreas {
    list: Option<Rect>,
    card: Option<Rect>,
    controls: Option<Rect>,
    logs: Option<Rect>,
}

fn forward(events: &ControlEvents, action: StreamAction) -> impl FnMut() + 'static {
    let events = Rc::clone(events);
    move || events.borrow_mut().push(ControlEvent::Requested(action))
}

pub struct App {
    feed: Feed,
    poll_interval: Duration,
    last_poll: Option<Instant>,
    feed_error: Option<String>,

    // Latest agent list; None until the first successful poll
    agents: Option<Vec<Agent>>,

    logs: LogHistory,
    // Records that arrived while paused
    pending: Vec<LogRecord>,
    controls: StreamControls,
    control_events: ControlEvents,
    log_scroll: usize,
    log_viewport: usize,

    route: Route,
    list_mode: ListMode,
    // Keyboard selection, or the row under the pointer in table mode
    selected: usize,
    table_scroll: usize,
    areas: HitAreas,

    // Agent intents for the embedding application to execute
    outbound: Vec<Intent>,
    status: Option<String>,
    clipboard: Clipboard,
    download_dir: PathBuf,

    should_quit: bool,
}

impl App {
    pub fn new(feed: Feed, poll_interval: Duration) -> Self {
        let control_events: ControlEvents = Rc::new(RefCell::new(Vec::new()));
        let mut controls = StreamControls::new();
        {
            let events = Rc::clone(&control_events);
            controls.subscribe(move |c| events.borrow_mut().push(ControlEvent::Changed(c)));
        }
        controls.on_clear(forward(&control_events, StreamAction::Clear));
        controls.on_copy(forward(&control_events, StreamAction::Copy));
        controls.on_download(forward(&control_events, StreamAction::Download));

        Self {
            feed,
            poll_interval,
            last_poll: None,
            feed_error: None,
            agents: None,
            logs: LogHistory::new(controls.line_cap()),
            pending: Vec::new(),
            controls,
            control_events,
            log_scroll: 0,
            log_viewport: 0,
            route: Route::Agents,
            list_mode: ListMode::default(),
            selected: 0,
            table_scroll: 0,
            areas: HitAreas::default(),
            outbound: Vec::new(),
            status: None,
            clipboard: Clipboard::Terminal,
            download_dir: PathBuf::from("."),
            should_quit: false,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Clipboard) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn list_mode(&self) -> ListMode {
        self.list_mode
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn controls(&self) -> &StreamControls {
        &self.controls
    }

    pub fn logs(&self) -> &LogHistory {
        &self.logs
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn feed_error(&self) -> Option<&str> {
        self.feed_error.as_deref()
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Drain the agent intents dispatched since the last call.
    pub fn take_outbound(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.outbound)
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Terminal setup
        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal).await;

        // Teardown
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                match event::read()? {
                    Event::Key(k) => self.handle_key(k),
                    Event::Mouse(m) => self.handle_mouse(m),
                    _ => {}
                }
            }
            if self.should_quit {
                break;
            }

            if self.poll_due() {
                self.poll_feed().await;
            }

            terminal.draw(|f| self.draw(f))?;

            sleep(TICK).await;
        }
        Ok(())
    }

    fn poll_due(&self) -> bool {
        self.last_poll
            .map_or(true, |t| t.elapsed() >= self.poll_interval)
    }

    pub async fn poll_feed(&mut self) {
        match self.feed.poll().await {
            Ok(update) => self.apply_update(update),
            Err(e) => self.feed_failed(e),
        }
        self.last_poll = Some(Instant::now());
    }

    pub fn apply_update(&mut self, update: FeedUpdate) {
        let FeedUpdate { agents, new_logs } = update;
        self.agents = Some(agents);
        self.clamp_selection();

        if self.controls.is_paused() {
            self.pending.extend(new_logs);
            let cap = self.controls.line_cap();
            if self.pending.len() > cap {
                let excess = self.pending.len() - cap;
                self.pending.drain(..excess);
            }
        } else {
            self.logs.extend(new_logs);
        }
        self.feed_error = None;
    }

    fn feed_failed(&mut self, err: FeedError) {
        warn!(error = %err, "feed poll failed, keeping last snapshot");
        self.feed_error = Some(err.to_string());
    }

    fn clamp_selection(&mut self) {
        let n = self.agents.as_ref().map_or(0, Vec::len);
        self.selected = self.selected.min(n.saturating_sub(1));
    }

    fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.as_deref()?.iter().find(|a| a.id == id)
    }

    fn selected_agent(&self) -> Option<&Agent> {
        self.agents.as_deref()?.get(self.selected)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                if self.route != Route::Agents {
                    self.navigate(Route::Agents);
                } else if key.code == KeyCode::Esc {
                    self.should_quit = true;
                }
                return;
            }
            _ => {}
        }

        match self.route.clone() {
            Route::Agents => self.handle_list_key(key),
            Route::AgentDetail(id) => {
                if !self.handle_stream_key(key) {
                    if let KeyCode::Char(c) = key.code {
                        self.agent_key(&id, c);
                    }
                }
            }
            Route::AgentLogs(_) => {
                self.handle_stream_key(key);
            }
        }
        self.drain_control_events();
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let n = self.agents.as_ref().map_or(0, Vec::len);
        match key.code {
            KeyCode::Tab => {
                self.list_mode = match self.list_mode {
                    ListMode::Cards => ListMode::Table,
                    ListMode::Table => ListMode::Cards,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(n.saturating_sub(1))
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = n.saturating_sub(1),
            KeyCode::Enter => self.selected_key('\n'),
            KeyCode::Char(c) => self.selected_key(c),
            _ => {}
        }
    }

    // Card toolbar keys in card mode, row keys in table mode; Enter opens detail.
    fn selected_key(&mut self, c: char) {
        let Some(agent) = self.selected_agent().cloned() else {
            return;
        };
        let mut fired = Vec::new();
        match (self.list_mode, c) {
            (_, '\n') | (ListMode::Table, _) => {
                dispatch_row_key(&agent, c, &mut |i| fired.push(i));
            }
            (ListMode::Cards, _) => {
                dispatch_card_key(&agent, c, &mut |i| fired.push(i));
            }
        }
        for intent in fired {
            self.dispatch(intent);
        }
    }

    fn agent_key(&mut self, id: &str, c: char) {
        let Some(agent) = self.agent(id).cloned() else {
            return;
        };
        let mut fired = Vec::new();
        dispatch_card_key(&agent, c, &mut |i| fired.push(i));
        for intent in fired {
            self.dispatch(intent);
        }
    }

    /// Mouse input, hit-tested against the areas of the last drawn frame.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let areas = self.areas;
        let mut fired = Vec::new();
        match self.route.clone() {
            Route::Agents => self.list_mouse(mouse, areas.list, &mut fired),
            Route::AgentDetail(id) => {
                if let (Some(area), Some(agent)) = (areas.card, self.agent(&id)) {
                    card_handle_mouse(agent, area, mouse, &mut |i| fired.push(i));
                }
                self.stream_mouse(mouse, areas);
            }
            Route::AgentLogs(_) => self.stream_mouse(mouse, areas),
        }
        for intent in fired {
            self.dispatch(intent);
        }
        self.drain_control_events();
    }

    fn list_mouse(&mut self, mouse: MouseEvent, area: Option<Rect>, fired: &mut Vec<Intent>) {
        let (Some(area), Some(agents)) = (area, self.agents.as_deref()) else {
            return;
        };
        let pointed = match self.list_mode {
            ListMode::Table => row_handle_mouse(
                agents,
                Some(self.selected),
                self.table_scroll,
                mouse,
                area,
                &mut |i| fired.push(i),
            ),
            ListMode::Cards => {
                cards_handle_mouse(agents, self.selected, mouse, area, &mut |i| fired.push(i))
            }
        };
        if let Some(i) = pointed {
            self.selected = i;
        }
    }

    fn stream_mouse(&mut self, mouse: MouseEvent, areas: HitAreas) {
        if let Some(area) = areas.controls {
            if let Some(button) = controls_handle_mouse(&self.controls, mouse, area) {
                self.press_control(button);
            }
        }
        if areas.logs.is_some_and(|a| hit(a, &mouse)) {
            match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_logs(-WHEEL_STEP),
                MouseEventKind::ScrollDown => self.scroll_logs(WHEEL_STEP),
                _ => {}
            }
        }
    }

    // Keys and clicks on the control bar both land here.
    fn press_control(&mut self, button: ControlButton) {
        match button {
            ControlButton::Follow => self.controls.toggle_following(),
            ControlButton::Pause => self.controls.toggle_paused(),
            ControlButton::Level => {
                self.controls.cycle_level_filter();
                self.log_scroll = 0;
            }
            ControlButton::Lines => {
                self.controls.cycle_line_cap();
                self.logs.set_cap(self.controls.line_cap());
                debug!(cap = self.logs.cap(), "log line cap changed");
            }
            ControlButton::Clear => self.controls.clear(),
            ControlButton::Copy => self.controls.copy(),
            ControlButton::Download => self.controls.download(),
        }
    }

    fn handle_stream_key(&mut self, key: KeyEvent) -> bool {
        if let KeyCode::Char(c) = key.code {
            if let Some(button) = ControlButton::from_key(c) {
                self.press_control(button);
                return true;
            }
        }
        match key.code {
            KeyCode::Up => self.scroll_logs(-1),
            KeyCode::Down => self.scroll_logs(1),
            KeyCode::PageUp => self.scroll_logs(-(PAGE as isize)),
            KeyCode::PageDown => self.scroll_logs(PAGE as isize),
            KeyCode::Home => self.log_scroll = 0,
            KeyCode::End => self.log_scroll = self.log_tail_offset(),
            _ => return false,
        }
        true
    }

    fn visible_log_count(&self) -> usize {
        self.logs.filtered(self.controls.level_filter()).len()
    }

    fn log_tail_offset(&self) -> usize {
        self.visible_log_count().saturating_sub(self.log_viewport)
    }

    fn scroll_logs(&mut self, delta: isize) {
        // Following pins the view to the tail; scrolling has no effect then.
        if self.controls.is_following() {
            return;
        }
        let max = self.log_tail_offset();
        self.log_scroll = self.log_scroll.saturating_add_signed(delta).min(max);
    }

    fn drain_control_events(&mut self) {
        let events: Vec<ControlEvent> = self.control_events.borrow_mut().drain(..).collect();
        for ev in events {
            debug!(?ev, "stream control event");
            match ev {
                ControlEvent::Changed(ControlChange::Paused(false)) => {
                    let held = std::mem::take(&mut self.pending);
                    self.logs.extend(held);
                }
                ControlEvent::Changed(ControlChange::Following(false)) => {
                    self.log_scroll = self.log_tail_offset();
                }
                ControlEvent::Changed(_) => {}
                ControlEvent::Requested(action) => self.dispatch(Intent::Stream(action)),
            }
        }
    }

    pub fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::Navigate(route) => self.navigate(route),
            Intent::Agent {
                id,
                action: AgentAction::View,
            } => self.navigate(Route::AgentDetail(id)),
            Intent::Agent {
                id,
                action: AgentAction::Logs,
            } => self.navigate(Route::AgentLogs(id)),
            Intent::Agent { id, action } => {
                info!(agent = %id, action = action.label(), "agent action requested");
                let name = self.agent(&id).map_or_else(|| id.clone(), |a| a.name.clone());
                self.status = Some(format!("{} requested for {name}", action.label()));
                self.outbound.push(Intent::Agent { id, action });
            }
            Intent::Stream(action) => self.run_stream_action(action),
        }
    }

    fn navigate(&mut self, route: Route) {
        info!(route = %route, "navigate");
        self.route = route;
        self.log_scroll = 0;
    }

    fn filtered_text(&self) -> (usize, String) {
        let lines: Vec<String> = self
            .logs
            .filtered(self.controls.level_filter())
            .into_iter()
            .map(plain_line)
            .collect();
        (lines.len(), lines.join("\n"))
    }

    fn run_stream_action(&mut self, action: StreamAction) {
        match action {
            StreamAction::Clear => {
                let n = self.logs.len();
                self.logs.clear();
                self.pending.clear();
                self.log_scroll = 0;
                info!(lines = n, "log buffer cleared");
                self.status = Some(format!("cleared {n} lines"));
            }
            StreamAction::Copy => {
                let (n, text) = self.filtered_text();
                self.status = Some(match self.clipboard.set(&text) {
                    Ok(()) => {
                        info!(lines = n, "copied logs to clipboard");
                        format!("copied {n} lines")
                    }
                    Err(e) => {
                        warn!(error = %e, "copy to clipboard failed");
                        format!("copy failed: {e}")
                    }
                });
            }
            StreamAction::Download => {
                let (n, text) = self.filtered_text();
                self.status = Some(match write_download(&self.download_dir, &text) {
                    Ok(path) => {
                        info!(lines = n, path = %path.display(), "saved logs");
                        format!("saved {n} lines to {}", path.display())
                    }
                    Err(e) => {
                        warn!(error = %e, "saving logs failed");
                        format!("download failed: {e}")
                    }
                });
            }
        }
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();
        self.areas = HitAreas::default();

        // Root rows: header, body, status line
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        draw_header(
            f,
            rows[0],
            &self.feed.describe(),
            self.agents.as_deref(),
            self.feed_error.as_deref(),
        );

        match self.route.clone() {
            Route::Agents => self.draw_agents(f, rows[1]),
            Route::AgentDetail(id) => self.draw_detail(f, rows[1], &id),
            Route::AgentLogs(_) => {
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3), Constraint::Min(3)])
                    .split(rows[1]);
                self.draw_stream(f, parts[0], parts[1]);
            }
        }

        let status = Line::from(vec![
            Span::styled(self.route.href(), Style::default().fg(MUTED)),
            Span::raw("  "),
            Span::raw(self.status.clone().unwrap_or_default()),
        ]);
        f.render_widget(Paragraph::new(status), rows[2]);
    }

    fn draw_agents(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(agents) = self.agents.as_deref() else {
            f.render_widget(Paragraph::new("waiting for feed..."), area);
            return;
        };
        if agents.is_empty() {
            f.render_widget(Paragraph::new("no agents reported"), area);
            return;
        }
        self.areas.list = Some(area);
        match self.list_mode {
            ListMode::Table => {
                // borders (2) + header (1)
                let viewport = area.height.saturating_sub(3).max(1) as usize;
                if self.selected < self.table_scroll {
                    self.table_scroll = self.selected;
                } else if self.selected >= self.table_scroll + viewport {
                    self.table_scroll = self.selected + 1 - viewport;
                }
                draw_agent_table(f, area, agents, Some(self.selected), self.table_scroll);
            }
            ListMode::Cards => {
                for (i, rect) in card_column(area, agents, self.selected) {
                    draw_agent_card(f, rect, &agents[i], i == self.selected);
                }
            }
        }
    }

    fn draw_detail(&mut self, f: &mut ratatui::Frame<'_>, area: Rect, id: &str) {
        let agent = self.agent(id).cloned();
        let card_h = agent
            .as_ref()
            .map_or(3, card_height)
            .min(area.height / 2);
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(card_h),
                Constraint::Length(3),
                Constraint::Min(3),
            ])
            .split(area);
        match &agent {
            Some(a) => {
                draw_agent_card(f, parts[0], a, true);
                self.areas.card = Some(parts[0]);
            }
            None => f.render_widget(
                Paragraph::new(format!("agent {id} is no longer reported"))
                    .block(Block::default().borders(Borders::ALL)),
                parts[0],
            ),
        }
        self.draw_stream(f, parts[1], parts[2]);
    }

    // Records carry no agent, so every route shows the same fleet-wide pane.
    fn draw_stream(&mut self, f: &mut ratatui::Frame<'_>, controls_area: Rect, log_area: Rect) {
        draw_controls(f, controls_area, &self.controls);
        self.areas.controls = Some(controls_area);
        self.areas.logs = Some(log_area);
        self.log_viewport = log_area.height.saturating_sub(2) as usize;
        let title = if self.pending.is_empty() {
            LOG_PANE_TITLE.to_string()
        } else {
            format!("{LOG_PANE_TITLE} [paused, {} held]", self.pending.len())
        };
        let visible = self.logs.filtered(self.controls.level_filter());
        draw_log_view(
            f,
            log_area,
            &title,
            visible.iter().copied(),
            self.log_scroll,
            self.controls.is_following(),
        );
    }
}

// Stack cards top to bottom, starting early enough that the selected one fits.
fn card_column(area: Rect, agents: &[Agent], selected: usize) -> Vec<(usize, Rect)> {
    let Some(sel) = agents.get(selected) else {
        return Vec::new();
    };
    let mut first = selected;
    let mut used = card_height(sel);
    while first > 0 {
        let h = card_height(&agents[first - 1]);
        if used + h > area.height {
            break;
        }
        used += h;
        first -= 1;
    }

    let bottom = area.y + area.height;
    let mut y = area.y;
    let mut slots = Vec::new();
    for (i, a) in agents.iter().enumerate().skip(first) {
        let h = card_height(a).min(bottom - y);
        if h < 3 {
            break;
        }
        slots.push((
            i,
            Rect {
                x: area.x,
                y,
                width: area.width,
                height: h,
            },
        ));
        y += h;
    }
    slots
}

// A left click selects the card under it and fires any toolbar hint it hit.
fn cards_handle_mouse(
    agents: &[Agent],
    selected: usize,
    mouse: MouseEvent,
    area: Rect,
    dispatch: &mut impl FnMut(Intent),
) -> Option<usize> {
    if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
        return None;
    }
    let (i, rect) = card_column(area, agents, selected)
        .into_iter()
        .find(|(_, rect)| hit(*rect, &mouse))?;
    card_handle_mouse(&agents[i], rect, mouse, dispatch);
    Some(i)
}

fn write_download(dir: &Path, text: &str) -> io::Result<PathBuf> {
    let ts = Local::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("agentdeck-logs-{ts}.log"));
    std::fs::write(&path, format!("{text}\n"))?;
    Ok(path)
}
