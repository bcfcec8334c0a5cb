//! UI module root: exposes the dashboard components.

pub mod card;
pub mod controls;
pub mod header;
pub mod log_line;
pub mod row;
pub mod status;
pub mod theme;
pub mod util;
