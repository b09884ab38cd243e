//! The poll loop.
//!
//! A single dedicated thread acquires one record per tick, rotates the daily
//! files at date changes, updates the shared series, appends to the log and
//! publishes render commands to every attached session. It stops only when
//! the host drops its [`HostGuard`].

use chrono::{Local, NaiveDate, NaiveDateTime};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::dispatch::{Chart, RenderCommand};
use crate::record::{TelemetryRecord, ValueField};
use crate::sample::Sample;
use crate::series::{DaySeries, SeriesSet, YesterdaySeries};
use crate::source::{SourceError, TelemetrySource};
use crate::state::SharedState;
use crate::store::{DailyFileStore, DayHistory};

/// Poll loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
}

/// Read side of the host liveness flag.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

/// Held by the host for as long as it is alive. Dropping it (including
/// during unwinding) tells the poll loop to shut down.
#[derive(Debug)]
pub struct HostGuard(Arc<AtomicBool>);

impl Liveness {
    /// Creates a live flag and the guard that owns it.
    pub fn new() -> (Liveness, HostGuard) {
        let flag = Arc::new(AtomicBool::new(true));
        (Liveness(flag.clone()), HostGuard(flag))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl HostGuard {
    /// Signals shutdown explicitly.
    pub fn release(self) {}
}

impl Drop for HostGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Replaces today/yesterday after a rotation and queues the full-replace
/// commands.
fn apply_rotation(
    series: &mut SeriesSet,
    date: NaiveDate,
    history: DayHistory,
    commands: &mut Vec<RenderCommand>,
) {
    series.today = DaySeries::from_samples(history.today);
    series.yesterday = YesterdaySeries::new(DaySeries::from_samples(history.yesterday).into_samples());
    series.date = Some(date);
    commands.push(RenderCommand::replace(Chart::Today, series.today.samples()));
    commands.push(RenderCommand::replace(Chart::Yesterday, series.yesterday.samples()));
}

/// Starts a new day in memory when the files for `date` could not be opened.
/// Today moves to yesterday only if it was the previous day.
fn roll_over(series: &mut SeriesSet, date: NaiveDate, commands: &mut Vec<RenderCommand>) {
    let previous = std::mem::take(&mut series.today);
    series.yesterday = if series.date == date.pred_opt() {
        YesterdaySeries::new(previous.into_samples())
    } else {
        YesterdaySeries::default()
    };
    series.date = Some(date);
    commands.push(RenderCommand::replace(Chart::Today, series.today.samples()));
    commands.push(RenderCommand::replace(Chart::Yesterday, series.yesterday.samples()));
}

/// The poll loop and everything it owns.
pub struct PollLoop<S> {
    state: SharedState,
    source: S,
    store: DailyFileStore,
    liveness: Liveness,
    interval: Duration,
    value_field: ValueField,
    loop_state: LoopState,
}

impl<S: TelemetrySource> PollLoop<S> {
    pub fn new(state: SharedState, source: S, store: DailyFileStore, liveness: Liveness) -> Self {
        let interval = state.config.interval();
        let value_field = state.config.viewer.value_field;
        Self {
            state,
            source,
            store,
            liveness,
            interval,
            value_field,
            loop_state: LoopState::Running,
        }
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Opens the files for `date` and publishes its history before the first
    /// sample arrives, so early sessions do not see empty day charts.
    pub fn prime(&mut self, date: NaiveDate) {
        let Some(history) = self.rotate(date) else {
            return;
        };
        let state = &self.state;
        state.registry.publish(|| {
            let mut series = state.series.write().unwrap_or_else(|p| p.into_inner());
            let mut commands = Vec::with_capacity(2);
            apply_rotation(&mut series, date, history, &mut commands);
            commands
        });
    }

    fn rotate(&mut self, date: NaiveDate) -> Option<DayHistory> {
        match self.store.rotate(date) {
            Ok(history) => {
                self.state.stats.record_rotation();
                if let Ok(mut current) = self.state.current_log.write() {
                    *current = self.store.current_path().map(|p| p.to_path_buf());
                }
                Some(history)
            }
            Err(e) => {
                error!("Daily log rotation to {} failed: {}", date, e);
                None
            }
        }
    }

    /// Runs one tick: liveness check, acquisition, then [`PollLoop::process`].
    pub fn tick(&mut self) -> LoopState {
        if !self.liveness.is_alive() {
            self.shutdown();
            return self.loop_state;
        }

        let started = Instant::now();
        let acquired = self.source.acquire(self.interval);
        self.state
            .stats
            .record_acquire(started.elapsed().as_secs_f64());

        let failed = acquired.is_err();
        self.process(Local::now().naive_local(), acquired);

        // A failing source returns immediately; keep the cadence anyway.
        if failed {
            thread::sleep(self.interval);
        }
        self.loop_state
    }

    /// Turns one acquisition outcome into a sample and applies it: rotation
    /// if the date changed, series update, render publication, log append.
    ///
    /// A timestamp earlier than the last sample of the day (the local clock
    /// went back, e.g. at the end of DST) is raised to that last timestamp so
    /// the day stays ordered. Returns the sample as stored.
    pub fn process(
        &mut self,
        timestamp: NaiveDateTime,
        acquired: Result<TelemetryRecord, SourceError>,
    ) -> Sample {
        let record = match acquired {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Telemetry acquisition from {} failed: {}", self.source.name(), e);
                self.state.stats.record_source_error();
                None
            }
        };

        let value = record.as_ref().and_then(|r| r.value(self.value_field));
        if value.is_none() && record.is_some() {
            debug!("Record lacks {:?}, recording sentinel", self.value_field);
        }

        let date = timestamp.date();
        let history = if self.store.current_date() != Some(date) {
            self.rotate(date)
        } else {
            None
        };

        let mut sample = Sample { timestamp, value };
        let state = &self.state;
        state.registry.publish(|| {
            let mut series = state.series.write().unwrap_or_else(|p| p.into_inner());
            let mut commands = Vec::with_capacity(4);

            match history {
                Some(history) => apply_rotation(&mut series, date, history, &mut commands),
                None if series.date != Some(date) => roll_over(&mut series, date, &mut commands),
                None => {}
            }

            if let Some(last) = series.today.last_timestamp() {
                sample.timestamp = sample.timestamp.max(last);
            }
            series.today.push(sample);
            series.rolling.push(sample);
            let limit = series.rollover_limit();
            commands.push(RenderCommand::stream(Chart::Now, &[sample], Some(limit)));
            commands.push(RenderCommand::stream(Chart::Today, &[sample], None));
            commands
        });

        if sample.timestamp != timestamp {
            debug!(
                "Clock went back to {}, stamping sample at {}",
                timestamp, sample.timestamp
            );
            self.state.stats.record_clock_regression();
        }

        self.state.stats.record_sample(value);
        if let Err(e) = self.store.append(&sample, record.as_ref()) {
            warn!("Failed to append sample to daily log: {}", e);
            self.state.stats.record_append_failure();
        }
        sample
    }

    /// Flushes and closes the log files.
    pub fn shutdown(&mut self) {
        if self.loop_state == LoopState::ShuttingDown {
            return;
        }
        info!("Host is gone, closing daily log files");
        self.store.close();
        self.loop_state = LoopState::ShuttingDown;
    }

    /// Runs until the host signals shutdown.
    pub fn run(mut self) {
        info!(
            "Poll loop started: source={}, interval={:?}",
            self.source.name(),
            self.interval
        );
        if self.liveness.is_alive() {
            self.prime(Local::now().date_naive());
        }
        while self.tick() == LoopState::Running {}
        info!("Poll loop stopped");
    }
}

impl<S: TelemetrySource + 'static> PollLoop<S> {
    /// Starts the loop on its own named thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("poll-loop".to_string())
            .spawn(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_drop_clears_liveness() {
        let (liveness, guard) = Liveness::new();
        let observer = liveness.clone();
        assert!(liveness.is_alive());
        drop(guard);
        assert!(!liveness.is_alive());
        assert!(!observer.is_alive());
    }

    #[test]
    fn test_release_clears_liveness() {
        let (liveness, guard) = Liveness::new();
        guard.release();
        assert!(!liveness.is_alive());
    }
}
