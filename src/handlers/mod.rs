//! HTTP endpoint handlers for the dashboard.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Dashboard page with the live and historic charts
//! - `/ws`: Viewer session WebSocket carrying render commands
//! - `/api/day/{date}`: One day's summary series as JSON
//! - `/health`: Poll loop statistics
//! - `/config`: Effective configuration display

pub mod config;
pub mod dashboard;
pub mod day;
pub mod health;
pub mod session;

// Re-export handlers
pub use config::config_handler;
pub use dashboard::dashboard_handler;
pub use day::day_handler;
pub use health::health_handler;
pub use session::session_handler;
