//! Arbitrary-day endpoint handler.
//!
//! Serves `/api/day/{date}` from the daily summary files, for the
//! dashboard's "some day" chart.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::sample::Point;
use crate::state::SharedState;
use crate::store::load_day;

/// Body of the /api/day response.
#[derive(Debug, Serialize)]
pub struct DaySeriesView {
    pub date: NaiveDate,
    pub points: Vec<Point>,
}

/// Parses a `YYYY-MM-DD` path segment.
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Handler for the /api/day/{date} endpoint.
#[instrument(skip(state))]
pub async fn day_handler(
    State(state): State<SharedState>,
    Path(date): Path<String>,
) -> Response {
    debug!("Processing /api/day request");

    let Some(date) = parse_day(&date) else {
        return (
            StatusCode::BAD_REQUEST,
            format!("invalid date '{date}', expected YYYY-MM-DD"),
        )
            .into_response();
    };

    let path = state.naming.path_for(date);
    let loaded = tokio::task::spawn_blocking(move || load_day(&path)).await;

    match loaded {
        Ok(Ok(samples)) => {
            debug!("Serving {} samples for {}", samples.len(), date);
            Json(DaySeriesView {
                date,
                points: samples.iter().map(|s| s.point()).collect(),
            })
            .into_response()
        }
        Ok(Err(e)) => {
            warn!("Failed to load day {}: {}", date, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            warn!("Day loader task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_day("2023-02-29"), None);
        assert_eq!(parse_day("yesterday"), None);
    }
}
