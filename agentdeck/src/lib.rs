//! agentdeck: terminal dashboard components for a fleet of managed agents.

pub mod app;
pub mod clipboard;
pub mod feed;
pub mod history;
pub mod intent;
pub mod profiles;
pub mod types;
pub mod ui;
