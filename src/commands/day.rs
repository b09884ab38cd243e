//! Day command implementation.
//!
//! Prints the samples logged for one day from the summary files.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::cli::DayFormat;
use crate::config::Config;
use crate::sample::{Sample, TIMESTAMP_FORMAT};
use crate::store::load_day;

/// Aggregates printed under the text listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub samples: usize,
    pub sentinels: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl DaySummary {
    pub fn from_samples(samples: &[Sample]) -> Self {
        let values: Vec<f64> = samples.iter().filter_map(|s| s.value).collect();
        let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
        Self {
            samples: samples.len(),
            sentinels: samples.len() - values.len(),
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
            mean,
        }
    }
}

#[derive(Serialize)]
struct JsonSample {
    timestamp: String,
    value: Option<f64>,
}

#[derive(Serialize)]
struct JsonDay {
    date: NaiveDate,
    summary: DaySummary,
    samples: Vec<JsonSample>,
}

/// Prints one day's summary series.
pub fn command_day(date: &str, format: DayFormat, config: &Config) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| anyhow!("invalid date '{}' (expected YYYY-MM-DD): {}", date, e))?;
    let path = config.viewer.summary_naming().path_for(date);
    let samples = load_day(&path).with_context(|| format!("failed to load day {date}"))?;
    let summary = DaySummary::from_samples(&samples);

    match format {
        DayFormat::Text => {
            for sample in &samples {
                println!("{}", sample.to_line());
            }
            println!();
            println!("📄 {}", path.display());
            println!(
                "   samples: {}  sentinels: {}  min: {}  max: {}  mean: {}",
                summary.samples,
                summary.sentinels,
                fmt_opt(summary.min),
                fmt_opt(summary.max),
                fmt_opt(summary.mean)
            );
        }
        DayFormat::Json => {
            let day = JsonDay {
                date,
                summary,
                samples: samples
                    .iter()
                    .map(|s| JsonSample {
                        timestamp: s.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                        value: s.value,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&day)?);
        }
    }

    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: u32, v: Option<f64>) -> Sample {
        Sample {
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, s)
                .unwrap(),
            value: v,
        }
    }

    #[test]
    fn test_summary_skips_sentinels() {
        let summary = DaySummary::from_samples(&[at(0, Some(10.0)), at(1, None), at(2, Some(30.0))]);
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.sentinels, 1);
        assert_eq!(summary.min, Some(10.0));
        assert_eq!(summary.max, Some(30.0));
        assert_eq!(summary.mean, Some(20.0));
    }

    #[test]
    fn test_summary_of_empty_day() {
        let summary = DaySummary::from_samples(&[]);
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.mean, None);
    }

    #[test]
    fn test_rejects_bad_date() {
        assert!(command_day("2024-13-01", DayFormat::Text, &Config::default()).is_err());
    }
}
