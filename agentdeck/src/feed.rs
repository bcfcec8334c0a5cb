//! Data sources for the dashboard: a JSON snapshot file re-read on each
//! poll, or a synthetic demo stream.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use crate::types::{Agent, AgentStatus, LogLevel, LogRecord, Snapshot};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What one poll yields: the current agent list and the log records that
/// arrived since the previous poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedUpdate {
    pub agents: Vec<Agent>,
    pub new_logs: Vec<LogRecord>,
}

#[derive(Debug)]
pub enum Feed {
    File(FileFeed),
    Demo(DemoFeed),
}

impl Feed {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Feed::File(FileFeed::new(path))
    }

    pub fn demo() -> Self {
        Feed::Demo(DemoFeed::default())
    }

    pub fn describe(&self) -> String {
        match self {
            Feed::File(f) => f.path().display().to_string(),
            Feed::Demo(_) => "demo".into(),
        }
    }

    pub async fn poll(&mut self) -> Result<FeedUpdate, FeedError> {
        match self {
            Feed::File(f) => f.poll().await,
            Feed::Demo(d) => Ok(d.tick()),
        }
    }
}

#[derive(Debug)]
pub struct FileFeed {
    path: PathBuf,
    // Newest record handed out so far
    last_delivered: Option<LogRecord>,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_delivered: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn poll(&mut self) -> Result<FeedUpdate, FeedError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FeedError::Io {
                path: self.path.clone(),
                source,
            })?;
        let snap = decode_snapshot(&raw).map_err(|source| FeedError::Decode {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.absorb(snap))
    }

    // The file holds a log tail that may slide forward; hand out what comes
    // after the newest record already delivered. If that record is gone the
    // writer rotated the file, so replay it all.
    fn absorb(&mut self, snap: Snapshot) -> FeedUpdate {
        let Snapshot { agents, mut logs } = snap;
        let start = self.last_delivered.as_ref().map_or(0, |last| {
            logs.iter().rposition(|r| r == last).map_or(0, |i| i + 1)
        });
        let new_logs = logs.split_off(start);
        if let Some(last) = new_logs.last() {
            self.last_delivered = Some(last.clone());
        }
        FeedUpdate { agents, new_logs }
    }
}

pub fn decode_snapshot(raw: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(raw)
}

const DEMO_MESSAGES: [(LogLevel, &str); 8] = [
    (LogLevel::Info, "container web-7f3c started"),
    (LogLevel::Debug, "heartbeat ok rtt=4ms"),
    (LogLevel::Info, "pulled image registry.local/api:1.9.2"),
    (LogLevel::Warn, "container worker-2 restarting (exit 137)"),
    (LogLevel::Debug, "gc pause 1.2ms"),
    (LogLevel::Error, "health probe failed: connection refused"),
    (LogLevel::Info, "scaled worker to 3 replicas"),
    (LogLevel::Warn, "disk usage above 80% on /var/lib/containers"),
];

/// Synthetic fleet that drifts a little on every tick.
#[derive(Debug, Default)]
pub struct DemoFeed {
    tick: u64,
}

impl DemoFeed {
    pub fn tick(&mut self) -> FeedUpdate {
        self.tick += 1;
        let t = self.tick;
        let flapping = t % 10 >= 6;

        let agents = vec![
            demo_agent(
                "edge-1",
                "10.0.0.4:7000",
                AgentStatus::Healthy,
                6,
                6,
                Some(t),
            ),
            demo_agent(
                "edge-2",
                "10.0.0.5:7000",
                if flapping {
                    AgentStatus::Degraded
                } else {
                    AgentStatus::Healthy
                },
                5,
                if flapping { 3 } else { 5 },
                Some(t + 40),
            ),
            demo_agent(
                "batch-1",
                "10.0.1.12:7000",
                AgentStatus::Degraded,
                5,
                2,
                None,
            ),
            demo_agent("gpu-1", "10.0.2.3:7000", AgentStatus::Unhealthy, 4, 0, None),
            demo_agent("lab-7", "192.168.7.70:7000", AgentStatus::Unknown, 0, 0, None),
        ];

        let now = Local::now().format("%H:%M:%S%.3f").to_string();
        let new_logs = (0..(t % 3 + 1))
            .map(|i| {
                let idx = (t * 3 + i) % DEMO_MESSAGES.len() as u64;
                let (level, msg) = DEMO_MESSAGES[idx as usize];
                LogRecord {
                    timestamp: now.clone(),
                    level,
                    message: msg.to_string(),
                }
            })
            .collect();

        FeedUpdate { agents, new_logs }
    }
}

fn demo_agent(
    name: &str,
    endpoint: &str,
    status: AgentStatus,
    containers: u32,
    running: u32,
    load: Option<u64>,
) -> Agent {
    let online = matches!(status, AgentStatus::Healthy | AgentStatus::Degraded);
    Agent {
        id: name.to_string(),
        name: name.to_string(),
        endpoint: endpoint.to_string(),
        status,
        container_count: containers,
        running_count: running,
        cpu: load.map(|l| format!("{}%", 5 + l % 60)),
        memory: load.map(|l| format!("{:.1} GiB", 1.0 + (l % 20) as f64 / 10.0)),
        disk: None,
        uptime: if online { "3d 4h".into() } else { String::new() },
        last_seen: if online { "just now".into() } else { "14m ago".into() },
        version: "1.4.2".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::ops::Range;

    fn snapshot_json(window: Range<usize>) -> String {
        let logs: Vec<String> = window
            .map(|i| format!(r#"{{"timestamp":"t{i}","level":"info","message":"m{i}"}}"#))
            .collect();
        let agent = r#"{"id":"a","name":"a","endpoint":"h:1","status":"healthy","#;
        let counts = r#""containerCount":1,"runningCount":1}"#;
        format!(r#"{{"agents":[{agent}{counts}],"logs":[{}]}}"#, logs.join(","))
    }

    fn absorb(feed: &mut FileFeed, window: Range<usize>) -> Vec<String> {
        let snap = decode_snapshot(&snapshot_json(window)).unwrap();
        feed.absorb(snap)
            .new_logs
            .into_iter()
            .map(|r| r.message)
            .collect()
    }

    #[test]
    fn absorb_hands_out_only_new_records() {
        let mut feed = FileFeed::new("unused.json");
        assert_eq!(absorb(&mut feed, 0..2), vec!["m0", "m1"]);
        assert_eq!(absorb(&mut feed, 0..5), vec!["m2", "m3", "m4"]);
        assert!(absorb(&mut feed, 0..5).is_empty());
    }

    #[test]
    fn sliding_window_delivers_appended_records() {
        let mut feed = FileFeed::new("unused.json");
        assert_eq!(absorb(&mut feed, 0..3), vec!["m0", "m1", "m2"]);
        // Same length, oldest two dropped, two appended
        assert_eq!(absorb(&mut feed, 2..5), vec!["m3", "m4"]);
        assert_eq!(absorb(&mut feed, 4..7), vec!["m5", "m6"]);
        assert!(absorb(&mut feed, 4..7).is_empty());
    }

    #[test]
    fn rotated_log_is_replayed() {
        let mut feed = FileFeed::new("unused.json");
        absorb(&mut feed, 0..4);
        assert_eq!(absorb(&mut feed, 0..1), vec!["m0"]);
        assert_eq!(absorb(&mut feed, 0..2), vec!["m1"]);
        // An emptied file delivers nothing and keeps the anchor
        assert!(absorb(&mut feed, 0..0).is_empty());
        assert_eq!(absorb(&mut feed, 0..3), vec!["m2"]);
    }

    #[tokio::test]
    async fn file_feed_reads_and_reports_errors() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{}", snapshot_json(0..1)).unwrap();
        let mut feed = Feed::file(tmp.path());
        assert_eq!(feed.describe(), tmp.path().display().to_string());
        let up = feed.poll().await.unwrap();
        assert_eq!(up.agents.len(), 1);
        assert_eq!(up.new_logs.len(), 1);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"logs":[{{"timestamp":"t","level":"trace","message":"x"}}]}}"#).unwrap();
        let err = Feed::file(bad.path()).poll().await.unwrap_err();
        assert!(matches!(err, FeedError::Decode { .. }));

        let missing = Feed::file("/nonexistent/agentdeck/snapshot.json").poll().await;
        assert!(matches!(missing, Err(FeedError::Io { .. })));
    }

    #[test]
    fn demo_covers_every_status_and_emits_logs() {
        let mut demo = DemoFeed::default();
        let up = demo.tick();
        for s in AgentStatus::ALL {
            assert!(up.agents.iter().any(|a| a.status == s), "{s:?}");
        }
        assert!(!up.new_logs.is_empty());
        let down = up.agents.iter().find(|a| a.status == AgentStatus::Unhealthy).unwrap();
        assert!(down.cpu.is_none());
    }
}
