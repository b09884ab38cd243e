//! Integration tests for the view registry.
//!
//! These tests verify the initial sync scheduled on attach, detach with
//! several sessions, and attach or detach racing with publication.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use pv_dashboard::dispatch::{Chart, RenderCommand, SessionQueue, SessionReceiver};
use pv_dashboard::series::{SeriesSet, YesterdaySeries};
use pv_dashboard::{Sample, ViewRegistry};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 8, 15)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn sample(i: i64) -> Sample {
    Sample::new(base() + Duration::seconds(i), i as f64)
}

fn drain(rx: &mut SessionReceiver) -> Vec<RenderCommand> {
    let mut commands = Vec::new();
    while let Ok(command) = rx.try_recv() {
        commands.push(command);
    }
    commands
}

#[test]
fn test_attach_schedules_initial_sync() {
    let mut set = SeriesSet::new(20, base());
    for i in 1..=5 {
        set.today.push(sample(i));
    }
    set.yesterday = YesterdaySeries::new(Vec::new());
    let series = RwLock::new(set);

    let registry = ViewRegistry::new();
    let (queue, mut rx) = SessionQueue::channel();
    registry.attach(queue, &series);

    let commands = drain(&mut rx);
    assert_eq!(commands.len(), 3);

    match &commands[0] {
        RenderCommand::Stream {
            chart,
            points,
            rollover,
        } => {
            assert_eq!(*chart, Chart::Now);
            assert_eq!(points.len(), 20);
            assert_eq!(*rollover, Some(20));
        }
        other => panic!("expected now stream, got {other:?}"),
    }
    assert!(matches!(&commands[1], RenderCommand::Replace { chart: Chart::Today, points } if points.len() == 5));
    assert!(matches!(&commands[2], RenderCommand::Replace { chart: Chart::Yesterday, points } if points.is_empty()));
}

#[test]
fn test_detach_removes_only_named_session() {
    let series = RwLock::new(SeriesSet::new(4, base()));
    let registry = ViewRegistry::new();

    let mut receivers = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..4 {
        let (queue, rx) = SessionQueue::channel();
        ids.push(registry.attach(queue, &series));
        receivers.push(rx);
    }
    for rx in receivers.iter_mut() {
        drain(rx);
    }

    assert!(registry.detach(ids[2]));
    assert_eq!(registry.session_ids(), vec![ids[0], ids[1], ids[3]]);

    let delivered = registry.publish(|| vec![RenderCommand::stream(Chart::Today, &[sample(1)], None)]);
    assert_eq!(delivered, 3);
    for (i, rx) in receivers.iter_mut().enumerate() {
        let expected = if i == 2 { 0 } else { 1 };
        assert_eq!(drain(rx).len(), expected, "session {i}");
    }
}

#[test]
fn test_publish_reaches_every_session_in_order() {
    let series = RwLock::new(SeriesSet::new(2, base()));
    let registry = ViewRegistry::new();
    let (q1, mut r1) = SessionQueue::channel();
    let (q2, mut r2) = SessionQueue::channel();
    registry.attach(q1, &series);
    registry.attach(q2, &series);
    drain(&mut r1);
    drain(&mut r2);

    registry.publish(|| {
        vec![
            RenderCommand::replace(Chart::Today, &[]),
            RenderCommand::stream(Chart::Now, &[sample(1)], Some(2)),
        ]
    });

    for rx in [&mut r1, &mut r2] {
        let charts: Vec<_> = drain(rx).iter().map(|c| c.chart()).collect();
        assert_eq!(charts, vec![Chart::Today, Chart::Now]);
    }
}

#[test]
fn test_closed_session_does_not_block_others() {
    let series = RwLock::new(SeriesSet::new(2, base()));
    let registry = ViewRegistry::new();
    let (q1, r1) = SessionQueue::channel();
    let (q2, mut r2) = SessionQueue::channel();
    registry.attach(q1, &series);
    registry.attach(q2, &series);
    drop(r1);
    drain(&mut r2);

    let delivered = registry.publish(|| vec![RenderCommand::stream(Chart::Today, &[sample(1)], None)]);
    assert_eq!(delivered, 1);
    assert_eq!(drain(&mut r2).len(), 1);
}

/// A session attaching while samples are published sees every sample
/// exactly once: either in its initial today snapshot or as a stream.
#[test]
fn test_concurrent_attach_sees_each_sample_once() {
    const SAMPLES: i64 = 500;

    let series = Arc::new(RwLock::new(SeriesSet::new(5, base())));
    let registry = Arc::new(ViewRegistry::new());

    let publisher = {
        let series = series.clone();
        let registry = registry.clone();
        thread::spawn(move || {
            for i in 1..=SAMPLES {
                registry.publish(|| {
                    let mut set = series.write().unwrap();
                    set.today.push(sample(i));
                    vec![RenderCommand::stream(Chart::Today, &[sample(i)], None)]
                });
            }
        })
    };

    let mut receivers = Vec::new();
    for _ in 0..20 {
        let (queue, rx) = SessionQueue::channel();
        registry.attach(queue, &series);
        receivers.push(rx);
        thread::yield_now();
    }
    publisher.join().unwrap();

    for mut rx in receivers {
        let mut seen = Vec::new();
        for command in drain(&mut rx) {
            if command.chart() == Chart::Today {
                seen.extend(command.points().iter().map(|p| p.x));
            }
        }
        let expected: Vec<i64> = (1..=SAMPLES).map(|i| sample(i).point().x).collect();
        assert_eq!(seen, expected);
    }
}

/// Sessions detached while samples are being published stop receiving
/// exactly when detach returns; the others miss nothing.
#[test]
fn test_detach_during_publish_removes_exactly_one() {
    const SAMPLES: i64 = 2000;

    let series = Arc::new(RwLock::new(SeriesSet::new(5, base())));
    let registry = Arc::new(ViewRegistry::new());

    let mut receivers = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..6 {
        let (queue, mut rx) = SessionQueue::channel();
        ids.push(registry.attach(queue, &series));
        drain(&mut rx);
        receivers.push(rx);
    }

    let published = Arc::new(AtomicI64::new(0));
    let publisher = {
        let registry = registry.clone();
        let published = published.clone();
        thread::spawn(move || {
            for i in 1..=SAMPLES {
                registry.publish(|| vec![RenderCommand::stream(Chart::Today, &[sample(i)], None)]);
                published.store(i, Ordering::Release);
            }
        })
    };

    let mut before_detach = Vec::new();
    for (n, &victim) in [1usize, 3, 4].iter().enumerate() {
        let threshold = 400 * (n as i64 + 1);
        while published.load(Ordering::Acquire) < threshold {
            thread::yield_now();
        }
        assert!(registry.detach(ids[victim]));
        assert!(!registry.detach(ids[victim]));
        before_detach.push((victim, drain(&mut receivers[victim])));
    }
    publisher.join().unwrap();

    assert_eq!(registry.session_ids(), vec![ids[0], ids[2], ids[5]]);

    let expected: Vec<i64> = (1..=SAMPLES).map(|i| sample(i).point().x).collect();
    for (victim, commands) in before_detach {
        assert!(drain(&mut receivers[victim]).is_empty(), "session {victim}");
        let seen: Vec<i64> = commands
            .iter()
            .flat_map(|c| c.points().iter().map(|p| p.x))
            .collect();
        assert!(!seen.is_empty());
        assert_eq!(seen[..], expected[..seen.len()]);
    }
    for survivor in [0, 2, 5] {
        let seen: Vec<i64> = drain(&mut receivers[survivor])
            .iter()
            .flat_map(|c| c.points().iter().map(|p| p.x))
            .collect();
        assert_eq!(seen, expected, "session {survivor}");
    }
}
