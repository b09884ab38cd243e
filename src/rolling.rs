//! Rolling window module for the "now" chart.
//!
//! This module provides a fixed-size ringbuffer of samples. Unlike a plain
//! history buffer it is full from construction: it starts with `capacity`
//! synthetic samples so that every snapshot has exactly `capacity` points.

use chrono::NaiveDateTime;

use crate::sample::Sample;

/// Default number of samples kept in the rolling window.
pub const DEFAULT_ROLLOVER_LIMIT: usize = 20;

/// A circular buffer of samples with fixed length.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    entries: Vec<Sample>,
    capacity: usize,
    write_index: usize,
}

impl RollingWindow {
    /// Creates a window of `capacity` samples, all stamped `start` with value 0.
    ///
    /// A zero capacity is raised to 1.
    pub fn new(capacity: usize, start: NaiveDateTime) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: vec![Sample::new(start, 0.0); capacity],
            capacity,
            write_index: 0,
        }
    }

    /// Pushes a new sample, evicting the oldest one.
    pub fn push(&mut self, sample: Sample) {
        self.entries[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % self.capacity;
    }

    /// Returns all samples in chronological order (oldest to newest).
    pub fn snapshot(&self) -> Vec<Sample> {
        let mut result = Vec::with_capacity(self.capacity);
        result.extend_from_slice(&self.entries[self.write_index..]);
        result.extend_from_slice(&self.entries[..self.write_index]);
        result
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Sample {
        let idx = (self.write_index + self.capacity - 1) % self.capacity;
        self.entries[idx]
    }

    /// Always equal to `capacity()`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
