//! Replays inverter records from an NDJSON file.
//!
//! Each line holds one JSON status record as published by the inverter
//! stack. One record is returned per interval; the file wraps around at
//! the end so a short capture can drive the dashboard indefinitely.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::info;

use super::{SourceError, TelemetrySource};
use crate::record::TelemetryRecord;

pub struct ReplaySource {
    path: PathBuf,
    /// (line number, raw text) of every non-blank line.
    lines: Vec<(usize, String)>,
    position: usize,
}

impl ReplaySource {
    /// Reads the whole file. Fails if it cannot be read or has no records.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        let source = Self::from_content(&path, &content)?;
        info!(
            "Loaded {} replay records from {}",
            source.lines.len(),
            path.display()
        );
        Ok(source)
    }

    fn from_content(path: &Path, content: &str) -> Result<Self, SourceError> {
        let lines: Vec<(usize, String)> = content
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| (i + 1, l.to_string()))
            .collect();
        if lines.is_empty() {
            return Err(SourceError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            lines,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Decodes the next record without waiting.
    pub fn next_record(&mut self) -> Result<TelemetryRecord, SourceError> {
        let (line, text) = &self.lines[self.position];
        self.position = (self.position + 1) % self.lines.len();
        TelemetryRecord::from_json(text).map_err(|source| SourceError::Decode {
            path: self.path.clone(),
            line: *line,
            source,
        })
    }
}

impl TelemetrySource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn acquire(&mut self, interval: Duration) -> Result<TelemetryRecord, SourceError> {
        thread::sleep(interval);
        self.next_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ValueField;

    fn source(content: &str) -> ReplaySource {
        ReplaySource::from_content(Path::new("capture.ndjson"), content).unwrap()
    }

    #[test]
    fn test_cycles_through_records() {
        let mut src = source("{\"power\": 1}\n\n{\"power\": 2}\n");
        assert_eq!(src.len(), 2);

        let values: Vec<_> = (0..5)
            .map(|_| src.next_record().unwrap().value(ValueField::Power))
            .collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(1.0), Some(2.0), Some(1.0)]);
    }

    #[test]
    fn test_record_without_power_decodes() {
        let mut src = source("{\"temperature\": 20.5}\n");
        let record = src.next_record().unwrap();
        assert_eq!(record.value(ValueField::Power), None);
        assert_eq!(record.temperature, Some(20.5));
    }

    #[test]
    fn test_malformed_line_is_decode_error_and_advances() {
        let mut src = source("{\"power\": 1}\nnot json\n{\"power\": 3}\n");
        assert!(src.next_record().is_ok());

        match src.next_record() {
            Err(SourceError::Decode { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert_eq!(src.next_record().unwrap().power, Some(3.0));
    }

    #[test]
    fn test_empty_file_rejected() {
        let err = ReplaySource::from_content(Path::new("x"), "\n \n").err().unwrap();
        assert!(matches!(err, SourceError::Empty { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let err = ReplaySource::open("/nonexistent/replay.ndjson").err().unwrap();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
