//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that returns the
//! effective configuration as JSON with secrets redacted.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::{CommandSubscription, Config};
use crate::state::SharedState;

/// Body of the /config response.
#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub config: Config,
    pub mqtt_enabled: bool,
    pub influx_enabled: bool,
    pub command_subscriptions: Vec<CommandSubscription>,
}

impl ConfigView {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.redacted(),
            mqtt_enabled: config.ahoy.mqtt_enabled(),
            influx_enabled: config.ahoy.influx_enabled(),
            command_subscriptions: config.ahoy.command_subscriptions(),
        }
    }
}

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");
    Json(ConfigView::new(&state.config))
}
