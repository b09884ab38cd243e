//! Poll loop statistics for the `/health` endpoint.
//!
//! Counters are atomics and timing stats are small mutex-guarded running
//! aggregates, so the poll thread can record without coordinating with
//! HTTP handlers.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

/// Point-in-time view of a [`Stat`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatSnapshot {
    pub last: f64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub count: u64,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    pub fn snapshot(&self) -> StatSnapshot {
        match self.inner.lock() {
            Ok(s) => StatSnapshot {
                last: s.last,
                avg: s.avg(),
                max: s.max,
                min: s.min,
                count: s.count,
            },
            Err(_) => StatSnapshot::default(),
        }
    }
}

/// Counters and timings recorded by the poll loop.
pub struct PollStats {
    pub ticks: AtomicU64,
    pub sentinel_samples: AtomicU64,
    pub source_errors: AtomicU64,
    pub rotations: AtomicU64,
    pub append_failures: AtomicU64,
    pub clock_regressions: AtomicU64,
    pub sessions_attached: AtomicU64,
    pub acquire_seconds: Stat,
    pub value: Stat,
    pub start_time: Instant,
}

impl Default for PollStats {
    fn default() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            sentinel_samples: AtomicU64::new(0),
            source_errors: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            append_failures: AtomicU64::new(0),
            clock_regressions: AtomicU64::new(0),
            sessions_attached: AtomicU64::new(0),
            acquire_seconds: Stat::default(),
            value: Stat::default(),
            start_time: Instant::now(),
        }
    }
}

impl PollStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_acquire(&self, seconds: f64) {
        self.acquire_seconds.add_sample(seconds);
    }

    /// Counts one processed tick and its value (or sentinel).
    pub fn record_sample(&self, value: Option<f64>) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        match value {
            Some(v) => self.value.add_sample(v),
            None => {
                self.sentinel_samples.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_source_error(&self) {
        self.source_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_append_failure(&self) {
        self.append_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clock_regression(&self) {
        self.clock_regressions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_attached(&self) {
        self.sessions_attached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_table(&self) -> String {
        let acquire = self.acquire_seconds.snapshot();
        let value = self.value.snapshot();

        let left_col = 24usize;
        let col_w = 12usize;
        let mut out = String::new();

        writeln!(out, "POLL LOOP").ok();
        writeln!(out, "=========").ok();
        writeln!(out).ok();

        let counters = [
            ("ticks", &self.ticks),
            ("sentinel_samples", &self.sentinel_samples),
            ("source_errors", &self.source_errors),
            ("rotations", &self.rotations),
            ("append_failures", &self.append_failures),
            ("clock_regressions", &self.clock_regressions),
            ("sessions_attached_total", &self.sessions_attached),
        ];
        for (name, counter) in counters {
            writeln!(
                out,
                "{:left$} | {:>col$}",
                name,
                counter.load(Ordering::Relaxed),
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();
        for (name, snap, precision) in [("acquire (s)", acquire, 3usize), ("value", value, 1)] {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                name,
                format!("{:.p$}", snap.last, p = precision),
                format!("{:.p$}", snap.avg, p = precision),
                format!("{:.p$}", snap.max, p = precision),
                format!("{:.p$}", snap.min, p = precision),
                left = left_col,
                col = col_w
            )
            .ok();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stat() {
        let mut s = RunningStat::default();
        assert_eq!(s.avg(), 0.0);
        s.add(2.0);
        s.add(6.0);
        s.add(4.0);
        assert_eq!(s.avg(), 4.0);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 6.0);
        assert_eq!(s.last, 4.0);
    }

    #[test]
    fn test_record_sample_counts_sentinels() {
        let stats = PollStats::new();
        stats.record_sample(Some(100.0));
        stats.record_sample(None);
        stats.record_sample(None);
        stats.record_acquire(0.5);

        assert_eq!(stats.ticks.load(Ordering::Relaxed), 3);
        assert_eq!(stats.sentinel_samples.load(Ordering::Relaxed), 2);
        assert_eq!(stats.value.snapshot().count, 1);
        assert_eq!(stats.acquire_seconds.snapshot().last, 0.5);
    }

    #[test]
    fn test_render_table_lists_counters() {
        let stats = PollStats::new();
        stats.record_rotation();
        let table = stats.render_table();
        assert!(table.starts_with("POLL LOOP"));
        assert!(table.contains("rotations"));
        assert!(table.contains("acquire (s)"));
    }
}
