//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! poll loop statistics and session counts as plain text.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = concat!("pv-dashboard ", env!("CARGO_PKG_VERSION"));

/// Formats an uptime for humans.
pub fn format_uptime(uptime_seconds: u64) -> String {
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    }
}

/// Handler for the /health endpoint.
///
/// Returns 503 until the poll loop has opened a daily log file.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let current_log = state.current_log_path();
    let (status, message) = match &current_log {
        Some(_) => (StatusCode::OK, "OK"),
        None => (StatusCode::SERVICE_UNAVAILABLE, "No daily log file open"),
    };

    let uptime_str = format_uptime(state.stats.get_uptime_seconds());
    let table = state.stats.render_table();

    let mut sessions = String::new();
    writeln!(sessions, "SESSIONS").ok();
    writeln!(sessions, "========").ok();
    writeln!(sessions).ok();
    writeln!(sessions, "{:24} | {:>12}", "attached", state.registry.len()).ok();
    writeln!(
        sessions,
        "{:24} | {}",
        "current_log",
        current_log
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    )
    .ok();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\nUptime: {uptime_str}\n\n{table}\n{sessions}\n{FOOTER_TEXT}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(90), "1.5 minutes");
        assert_eq!(format_uptime(7200), "2.0 hours");
        assert_eq!(format_uptime(3 * 86400), "3.0 days");
    }
}
