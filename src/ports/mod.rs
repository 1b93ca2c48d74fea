//! Port traits the domain depends on.

pub mod asset_port;
pub mod config_port;
pub mod opportunity_port;
pub mod price_history_port;
pub mod report_port;
