//! Integration tests for the rolling "now" window.
//!
//! These tests verify that the window always holds exactly N samples and
//! that they are the last N pushed, in push order.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use pv_dashboard::rolling::RollingWindow;
use pv_dashboard::Sample;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 1)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap()
}

fn sample(i: i64) -> Sample {
    Sample::new(base() + Duration::seconds(i), i as f64)
}

#[test]
fn test_length_stays_capacity_for_any_push_count() {
    for capacity in [1usize, 2, 5, 20] {
        for pushes in 0..(capacity as i64 * 3 + 1) {
            let mut window = RollingWindow::new(capacity, base());
            for i in 1..=pushes {
                window.push(sample(i));
            }
            let snapshot = window.snapshot();
            assert_eq!(snapshot.len(), capacity);
            assert_eq!(window.len(), capacity);

            // The tail of the snapshot is the last min(pushes, N) samples.
            let kept = (pushes as usize).min(capacity);
            let expected: Vec<f64> = ((pushes - kept as i64 + 1)..=pushes).map(|i| i as f64).collect();
            let tail: Vec<f64> = snapshot[capacity - kept..]
                .iter()
                .map(|s| s.value.unwrap())
                .collect();
            assert_eq!(tail, expected, "capacity={capacity} pushes={pushes}");
        }
    }
}

#[test]
fn test_snapshot_is_oldest_first() {
    let mut window = RollingWindow::new(3, base());
    for i in 1..=7 {
        window.push(sample(i));
    }
    let timestamps: Vec<_> = window.snapshot().iter().map(|s| s.timestamp).collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted);
    assert_eq!(window.latest(), sample(7));
}

#[test]
fn test_sentinels_occupy_slots() {
    let mut window = RollingWindow::new(2, base());
    window.push(sample(1));
    window.push(Sample::sentinel(base() + Duration::seconds(2)));
    let snapshot = window.snapshot();
    assert_eq!(snapshot[0].value, Some(1.0));
    assert!(snapshot[1].is_sentinel());
}
