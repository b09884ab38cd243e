//! Telemetry sources.
//!
//! A source produces one [`TelemetryRecord`] per call and blocks for about
//! one poll interval doing so; the poll loop has no timer of its own.

pub mod cpu;
pub mod replay;

pub use cpu::CpuLoadSource;
pub use replay::ReplaySource;

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, SourceKind};
use crate::record::TelemetryRecord;

/// Errors raised while acquiring a record.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode record at {path}:{line}: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Parse(String),

    #[error("{path} contains no records")]
    Empty { path: PathBuf },
}

/// Something that yields telemetry records at the poll cadence.
pub trait TelemetrySource: Send {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Blocks for roughly `interval` and returns the next record.
    fn acquire(&mut self, interval: Duration) -> Result<TelemetryRecord, SourceError>;
}

impl<S: TelemetrySource + ?Sized> TelemetrySource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn acquire(&mut self, interval: Duration) -> Result<TelemetryRecord, SourceError> {
        (**self).acquire(interval)
    }
}

/// Builds the source selected by `viewer.source`.
pub fn from_config(config: &Config) -> Result<Box<dyn TelemetrySource>, SourceError> {
    match config.viewer.source {
        SourceKind::Cpu => Ok(Box::new(CpuLoadSource::new())),
        SourceKind::Replay => {
            let path = config
                .viewer
                .replay_file
                .clone()
                .ok_or_else(|| SourceError::Parse("replay source needs viewer.replay_file".into()))?;
            Ok(Box::new(ReplaySource::open(path)?))
        }
    }
}
