//! CPU load as placeholder telemetry.
//!
//! Reads the aggregate `cpu` line of /proc/stat, waits one interval, reads
//! it again and reports the busy share of the elapsed ticks as a percentage.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::debug;

use super::{SourceError, TelemetrySource};
use crate::record::TelemetryRecord;

const PROC_STAT: &str = "/proc/stat";

/// Aggregate CPU time counters from /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Calculate total CPU time (all fields).
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Calculate non-active time (idle + iowait).
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    /// Busy percentage between `previous` and `self`. `None` when no ticks
    /// elapsed.
    pub fn busy_percent_since(&self, previous: &CpuStat) -> Option<f64> {
        let delta_total = self.total().saturating_sub(previous.total());
        if delta_total == 0 {
            return None;
        }
        let delta_idle = self.idle_total().saturating_sub(previous.idle_total());
        let busy = delta_total.saturating_sub(delta_idle);
        Some(busy as f64 / delta_total as f64 * 100.0)
    }
}

/// Parses the aggregate `cpu ` line out of /proc/stat content.
pub fn parse_cpu_line(content: &str) -> Result<CpuStat, String> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| "No aggregate cpu line in /proc/stat".to_string())?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return Err(format!(
            "Invalid cpu line: expected at least 8 fields, got {}",
            parts.len()
        ));
    }

    let field = |i: usize| -> Result<u64, String> {
        parts
            .get(i)
            .map_or(Ok(0), |v| v.parse::<u64>())
            .map_err(|e| format!("Failed to parse cpu field {}: {}", i, e))
    };

    Ok(CpuStat {
        user: field(1)?,
        nice: field(2)?,
        system: field(3)?,
        idle: field(4)?,
        iowait: field(5)?,
        irq: field(6)?,
        softirq: field(7)?,
        steal: field(8)?,
    })
}

/// Samples system CPU busy percentage.
pub struct CpuLoadSource {
    path: PathBuf,
}

impl CpuLoadSource {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(PROC_STAT),
        }
    }

    fn read(&self) -> Result<CpuStat, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_cpu_line(&content).map_err(SourceError::Parse)
    }
}

impl Default for CpuLoadSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for CpuLoadSource {
    fn name(&self) -> &str {
        "cpu"
    }

    fn acquire(&mut self, interval: Duration) -> Result<TelemetryRecord, SourceError> {
        let before = self.read()?;
        thread::sleep(interval);
        let after = self.read()?;

        match after.busy_percent_since(&before) {
            Some(percent) => {
                debug!("CPU busy {:.1}%", percent);
                Ok(TelemetryRecord::with_power("cpu", percent))
            }
            // No ticks elapsed: the record has no value and the tick is a sentinel.
            None => Ok(TelemetryRecord {
                device: Some("cpu".to_string()),
                ..Default::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  100 0 50 800 50 0 0 0 0 0\n\
                        cpu0 50 0 25 400 25 0 0 0 0 0\n\
                        intr 12345\n";

    #[test]
    fn test_parse_cpu_line() {
        let stat = parse_cpu_line(STAT).unwrap();
        assert_eq!(stat.user, 100);
        assert_eq!(stat.system, 50);
        assert_eq!(stat.idle, 800);
        assert_eq!(stat.total(), 1000);
        assert_eq!(stat.idle_total(), 850);
    }

    #[test]
    fn test_parse_short_line_without_steal() {
        let stat = parse_cpu_line("cpu 1 2 3 4 5 6 7\n").unwrap();
        assert_eq!(stat.steal, 0);
        assert_eq!(stat.total(), 28);
    }

    #[test]
    fn test_parse_missing_line() {
        assert!(parse_cpu_line("intr 1\n").is_err());
        assert!(parse_cpu_line("cpu 1 2\n").is_err());
    }

    #[test]
    fn test_busy_percent() {
        let before = parse_cpu_line(STAT).unwrap();
        let after = CpuStat {
            user: 130,
            system: 70,
            idle: 840,
            iowait: 60,
            ..before
        };
        // delta total 100, delta idle 50 -> 50% busy
        assert_eq!(after.busy_percent_since(&before), Some(50.0));
        assert_eq!(before.busy_percent_since(&before), None);
    }
}
