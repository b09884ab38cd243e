//! In-memory series backing the three live charts.

use chrono::{NaiveDate, NaiveDateTime};

use crate::rolling::RollingWindow;
use crate::sample::Sample;

/// Samples of one calendar day, ordered by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaySeries {
    samples: Vec<Sample>,
}

impl DaySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from loaded samples, dropping any that would break
    /// timestamp order.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let mut series = Self::with_capacity(samples.len());
        for sample in samples {
            series.push(sample);
        }
        series
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n),
        }
    }

    /// Appends a sample. Returns false (and leaves the series unchanged) when
    /// the sample is older than the last one.
    pub fn push(&mut self, sample: Sample) -> bool {
        if let Some(last) = self.samples.last() {
            if sample.timestamp < last.timestamp {
                return false;
            }
        }
        self.samples.push(sample);
        true
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|s| s.timestamp)
    }
}

/// Read-only copy of the previous day. Replaced wholesale at rollover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YesterdaySeries {
    samples: Vec<Sample>,
}

impl YesterdaySeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The rolling/today/yesterday triple shared between the poll thread and
/// session handlers.
#[derive(Debug, Clone)]
pub struct SeriesSet {
    pub rolling: RollingWindow,
    pub today: DaySeries,
    pub yesterday: YesterdaySeries,
    /// Day `today` belongs to; `None` until the first rotation.
    pub date: Option<NaiveDate>,
}

impl SeriesSet {
    pub fn new(rollover_limit: usize, start: NaiveDateTime) -> Self {
        Self {
            rolling: RollingWindow::new(rollover_limit, start),
            today: DaySeries::new(),
            yesterday: YesterdaySeries::default(),
            date: None,
        }
    }

    pub fn rollover_limit(&self) -> usize {
        self.rolling.capacity()
    }
}
