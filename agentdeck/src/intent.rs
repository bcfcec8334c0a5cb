//! User intents forwarded out of the components, plus navigation routes.

use std::fmt;

/// Per-agent action the components can request. Executing it is the
/// embedding application's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAction {
    View,
    Logs,
    HealthCheck,
    Edit,
    Delete,
    Refresh,
    Reconnect,
    Remove,
}

impl AgentAction {
    pub fn key(self) -> char {
        match self {
            AgentAction::View => 'v',
            AgentAction::Logs => 'l',
            AgentAction::HealthCheck => 'h',
            AgentAction::Edit => 'e',
            AgentAction::Delete => 'd',
            AgentAction::Refresh => 'r',
            AgentAction::Reconnect => 'c',
            AgentAction::Remove => 'x',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgentAction::View => "view",
            AgentAction::Logs => "logs",
            AgentAction::HealthCheck => "health",
            AgentAction::Edit => "edit",
            AgentAction::Delete => "delete",
            AgentAction::Refresh => "refresh",
            AgentAction::Reconnect => "reconnect",
            AgentAction::Remove => "remove",
        }
    }

    /// Hint text for toolbars, e.g. `[v]iew`.
    pub fn hint(self) -> String {
        let label = self.label();
        let key = self.key();
        match label.find(key) {
            Some(0) => format!("[{key}]{}", &label[1..]),
            _ => format!("[{key}] {label}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Agents,
    AgentDetail(String),
    AgentLogs(String),
}

impl Route {
    pub fn href(&self) -> String {
        match self {
            Route::Agents => "/agents".into(),
            Route::AgentDetail(id) => format!("/agents/{id}"),
            Route::AgentLogs(id) => format!("/agents/{id}/logs"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

/// Log viewer toolbar intents. Carry no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAction {
    Clear,
    Copy,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Agent { id: String, action: AgentAction },
    Navigate(Route),
    Stream(StreamAction),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_render_as_paths() {
        assert_eq!(Route::Agents.href(), "/agents");
        assert_eq!(Route::AgentDetail("a-7".into()).href(), "/agents/a-7");
        assert_eq!(Route::AgentLogs("a-7".into()).to_string(), "/agents/a-7/logs");
    }

    #[test]
    fn hints_mark_the_key() {
        assert_eq!(AgentAction::View.hint(), "[v]iew");
        assert_eq!(AgentAction::Reconnect.hint(), "[c] reconnect");
        assert_eq!(AgentAction::Remove.hint(), "[x] remove");
    }
}
