//! Application state management for the dashboard.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers, session tasks and the poll thread.

use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::config::Config;
use crate::dispatch::SessionQueue;
use crate::poll_stats::PollStats;
use crate::registry::{SessionId, ViewRegistry};
use crate::series::SeriesSet;
use crate::store::LogNaming;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// State shared across the poll thread, HTTP handlers and sessions.
pub struct AppState {
    pub config: Arc<Config>,
    /// Rolling, today and yesterday series. Written only by the poll thread.
    pub series: RwLock<SeriesSet>,
    pub registry: ViewRegistry,
    pub stats: PollStats,
    /// Naming of the summary stream, for reading arbitrary days.
    pub naming: LogNaming,
    /// Summary file currently being appended to.
    pub current_log: RwLock<Option<PathBuf>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Builds the state with a rolling window stamped `start`.
    pub fn new(config: Config, start: NaiveDateTime) -> Self {
        let naming = config.viewer.summary_naming();
        let series = SeriesSet::new(config.viewer.rollover_limit, start);
        Self {
            config: Arc::new(config),
            series: RwLock::new(series),
            registry: ViewRegistry::new(),
            stats: PollStats::new(),
            naming,
            current_log: RwLock::new(None),
            start_time: Instant::now(),
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }

    /// Registers a viewer session and schedules its initial sync.
    pub fn attach_session(&self, queue: SessionQueue) -> SessionId {
        self.stats.record_session_attached();
        self.registry.attach(queue, &self.series)
    }

    pub fn detach_session(&self, id: SessionId) -> bool {
        self.registry.detach(id)
    }

    pub fn current_log_path(&self) -> Option<PathBuf> {
        self.current_log.read().ok().and_then(|p| p.clone())
    }
}
