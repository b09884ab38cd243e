//! Daily file store.
//!
//! One summary file per calendar day (`{base}{YYYY-MM-DD}{ext}`) receives a
//! `timestamp<TAB>value` line per sample, and an optional full-log file
//! receives a human-readable line per telemetry record. Rotation closes the
//! previous day's handles, opens today's files in append mode and reloads
//! today's and yesterday's summary files into memory.

use chrono::{Days, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::record::TelemetryRecord;
use crate::sample::{Sample, TIMESTAMP_FORMAT};

/// Errors raised by the daily file store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no log file is open")]
    NotOpen,
}

/// How the files of one log stream are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogNaming {
    pub dir: PathBuf,
    pub base: String,
    pub extension: String,
}

impl LogNaming {
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            extension: extension.into(),
        }
    }

    /// Path of the file for `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}",
            self.base,
            date.format("%Y-%m-%d"),
            self.extension
        ))
    }
}

/// Samples reloaded by a rotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayHistory {
    pub today: Vec<Sample>,
    pub yesterday: Vec<Sample>,
}

/// An open append-only file.
struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LogFile {
    fn open(path: PathBuf) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn write_line(&mut self, line: &str) -> Result<(), StoreError> {
        writeln!(self.writer, "{line}")
            .and_then(|_| self.writer.flush())
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn close(mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("Failed to flush {} on close: {}", self.path.display(), e);
        }
        debug!("Closed {}", self.path.display());
    }
}

/// Per-day append-only log files for the summary stream and the optional
/// full stream.
pub struct DailyFileStore {
    summary: LogNaming,
    full: Option<LogNaming>,
    date: Option<NaiveDate>,
    summary_file: Option<LogFile>,
    full_file: Option<LogFile>,
}

impl DailyFileStore {
    pub fn new(summary: LogNaming, full: Option<LogNaming>) -> Self {
        Self {
            summary,
            full,
            date: None,
            summary_file: None,
            full_file: None,
        }
    }

    /// Date of the currently open files.
    pub fn current_date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Path of the currently open summary file.
    pub fn current_path(&self) -> Option<&Path> {
        self.summary_file.as_ref().map(|f| f.path.as_path())
    }

    pub fn naming(&self) -> &LogNaming {
        &self.summary
    }

    /// Closes open handles, opens the files for `date` and reloads today's
    /// and yesterday's summary series.
    ///
    /// History that cannot be read is logged and treated as empty; only a
    /// failure to open today's summary file is an error.
    pub fn rotate(&mut self, date: NaiveDate) -> Result<DayHistory, StoreError> {
        self.close();
        self.date = None;

        if !self.summary.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.summary.dir).map_err(|source| StoreError::Open {
                path: self.summary.dir.clone(),
                source,
            })?;
        }

        let today_path = self.summary.path_for(date);
        let today = load_day_or_empty(&today_path);
        let yesterday = match date.checked_sub_days(Days::new(1)) {
            Some(prev) => load_day_or_empty(&self.summary.path_for(prev)),
            None => Vec::new(),
        };

        self.summary_file = Some(LogFile::open(today_path)?);
        self.full_file = match &self.full {
            Some(naming) => {
                let path = naming.path_for(date);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|source| StoreError::Open {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                Some(LogFile::open(path)?)
            }
            None => None,
        };
        self.date = Some(date);

        info!(
            "Rotated daily log to {} ({} samples today, {} yesterday)",
            self.summary.path_for(date).display(),
            today.len(),
            yesterday.len()
        );

        Ok(DayHistory { today, yesterday })
    }

    /// Appends one sample to the summary file and, when enabled, the record
    /// to the full log. Both are flushed immediately.
    pub fn append(&mut self, sample: &Sample, record: Option<&TelemetryRecord>) -> Result<(), StoreError> {
        let file = self.summary_file.as_mut().ok_or(StoreError::NotOpen)?;
        file.write_line(&sample.to_line())?;

        if let (Some(full), Some(record)) = (self.full_file.as_mut(), record) {
            full.write_line(&format!(
                "{}\t{}",
                sample.timestamp.format(TIMESTAMP_FORMAT),
                record
            ))?;
        }
        Ok(())
    }

    /// Flushes and closes all open files.
    pub fn close(&mut self) {
        if let Some(file) = self.summary_file.take() {
            file.close();
        }
        if let Some(file) = self.full_file.take() {
            file.close();
        }
    }
}

impl Drop for DailyFileStore {
    fn drop(&mut self) {
        self.close();
    }
}

/// Loads one summary file.
///
/// A missing file yields an empty series. Malformed lines are skipped.
pub fn load_day(path: &Path) -> Result<Vec<Sample>, StoreError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No log file at {}", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut samples = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match Sample::parse_line(&line) {
            Some(sample) => samples.push(sample),
            None => debug!(
                "Skipping malformed line {} in {}",
                lineno + 1,
                path.display()
            ),
        }
    }
    Ok(samples)
}

fn load_day_or_empty(path: &Path) -> Vec<Sample> {
    load_day(path).unwrap_or_else(|e| {
        warn!("{} - treating day as empty", e);
        Vec::new()
    })
}
