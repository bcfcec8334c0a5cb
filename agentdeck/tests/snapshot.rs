//! Snapshot decoding against a realistic API payload.
use agentdeck::feed::decode_snapshot;
use agentdeck::types::{AgentStatus, LogLevel};
use agentdeck::ui::card::{card_badge, card_layout, CardLayout};
use agentdeck::ui::row::DisplayStatus;

const FLEET: &str = r#"{
  "agents": [
    {"id": "a1", "name": "edge-1", "endpoint": "10.0.0.4:7000", "status": "healthy",
     "containerCount": 6, "runningCount": 6, "cpu": "14%", "memory": "2.1 GiB",
     "uptime": "3d 4h", "lastSeen": "just now", "version": "1.4.2"},
    {"id": "a2", "name": "batch-1", "endpoint": "10.0.1.12:7000", "status": "degraded",
     "containerCount": 5, "runningCount": 2, "cpu": null,
     "uptime": "3d", "lastSeen": "just now", "version": "1.4.2"},
    {"id": "a3", "name": "lab-7", "endpoint": "192.168.7.70:7000", "status": "rebooting",
     "containerCount": 0, "runningCount": 0, "lastSeen": "14m ago", "version": "1.3.0"}
  ],
  "logs": [
    {"timestamp": "12:00:01", "level": "info", "message": "container web started"},
    {"timestamp": "12:00:02", "level": "error", "message": "probe failed"}
  ]
}"#;

#[test]
fn decodes_fleet_and_maps_statuses() {
    let snap = decode_snapshot(FLEET).expect("decode fleet");
    assert_eq!(snap.agents.len(), 3);
    assert_eq!(snap.logs[1].level, LogLevel::Error);

    let degraded = &snap.agents[1];
    assert!(degraded.cpu.is_none() && degraded.memory.is_none());
    assert_eq!(card_badge(degraded.status).label, "DEGRADED");

    // out-of-set status falls back to unknown: disconnected card, unhealthy row
    let odd = &snap.agents[2];
    assert_eq!(odd.status, AgentStatus::Unknown);
    assert_eq!(card_layout(odd.status), CardLayout::Disconnected);
    assert_eq!(DisplayStatus::from(odd.status), DisplayStatus::Unhealthy);
}
