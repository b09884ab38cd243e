//! pv-dashboard library
//!
//! Live power dashboard for a home photovoltaic inverter. A dedicated poll
//! thread samples telemetry once per interval, keeps three series (a rolling
//! "now" window, today and yesterday), appends every sample to a per-day log
//! file and pushes incremental render commands to every open browser session.
//!
//! # Layout
//!
//! - [`store`]: daily log files, rotation at date change, history loading
//! - [`rolling`]: fixed-capacity window of the most recent samples
//! - [`poll`]: the poll loop and the host liveness guard
//! - [`registry`]: attached viewer sessions and their initial sync
//! - [`dispatch`]: render commands and per-session queues
//! - [`source`]: telemetry sources (CPU load, NDJSON replay)
//!
//! # Usage
//!
//! ```no_run
//! use pv_dashboard::config::Config;
//! use pv_dashboard::poll::{Liveness, PollLoop};
//! use pv_dashboard::source::CpuLoadSource;
//! use pv_dashboard::state::AppState;
//! use pv_dashboard::store::DailyFileStore;
//!
//! let config = Config::default();
//! let store = DailyFileStore::new(config.viewer.summary_naming(), config.viewer.full_naming());
//! let state = AppState::new(config, chrono::Local::now().naive_local()).shared();
//!
//! let (liveness, guard) = Liveness::new();
//! let handle = PollLoop::new(state, CpuLoadSource::new(), store, liveness)
//!     .spawn()
//!     .unwrap();
//!
//! // ... serve sessions ...
//! drop(guard);
//! handle.join().unwrap();
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod poll;
pub mod poll_stats;
pub mod record;
pub mod registry;
pub mod rolling;
pub mod sample;
pub mod series;
pub mod source;
pub mod state;
pub mod store;

pub use dispatch::{Chart, RenderCommand, SessionQueue};
pub use poll::{HostGuard, Liveness, PollLoop};
pub use registry::{SessionId, ViewRegistry};
pub use rolling::RollingWindow;
pub use sample::Sample;
pub use state::{AppState, SharedState};
pub use store::DailyFileStore;
