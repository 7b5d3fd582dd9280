// Integration tests for the temperature dashboard

use chrono::{Local, TimeZone};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tickboard::clock::FixedClock;
use tickboard::config::TemperatureConfig;
use tickboard::temperature::{Reading, ReadingHistory, ReadingSource, TemperatureDashboard};

/// Emits 1.0, 2.0, 3.0, ... so tests can tell readings apart.
#[derive(Default)]
struct Sequence(AtomicU32);

impl ReadingSource for Sequence {
    fn sample(&self) -> f32 {
        (self.0.fetch_add(1, Ordering::SeqCst) + 1) as f32
    }
}

fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Local.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap()))
}

fn dashboard() -> TemperatureDashboard {
    TemperatureDashboard::new(&TemperatureConfig::default(), Arc::new(Sequence::default()), fixed_clock())
}

async fn elapse(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[test]
fn test_empty_dashboard_reads_zero() {
    let d = dashboard();
    assert!(!d.is_running());
    assert_eq!(d.current(), 0.0);
    assert_eq!(d.average(), 0.0);
    assert_eq!(d.min(), 0.0);
    assert_eq!(d.max(), 0.0);
}

#[test]
fn test_recorded_readings_scenario() {
    let d = dashboard();
    d.record(70.0);
    d.record(75.0);
    d.record(72.0);
    assert_eq!(d.current(), 72.0);
    assert_eq!(d.min(), 70.0);
    assert_eq!(d.max(), 75.0);
    let readings = d.readings();
    assert_eq!(readings[0], Reading { value: 72.0, timestamp: "08:30:00".to_string() });
}

#[tokio::test(start_paused = true)]
async fn test_ticks_prepend_and_cap_history() {
    let mut d = dashboard();
    d.start().unwrap();
    elapse(2_500).await;
    assert_eq!(d.readings().len(), 1);
    assert_eq!(d.current(), 1.0);
    // 25 ticks in total at a 2s period.
    elapse(48_000).await;
    let values: Vec<f32> = d.readings().iter().map(|r| r.value).collect();
    let expected: Vec<f32> = (6..=25).rev().map(|v| v as f32).collect();
    assert_eq!(values, expected);
    assert_eq!(d.current(), 25.0);
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume() {
    let mut d = dashboard();
    d.start().unwrap();
    elapse(4_500).await;
    assert!(!d.toggle_running().unwrap());
    elapse(10_000).await;
    assert_eq!(d.readings().len(), 2);
    assert!(d.toggle_running().unwrap());
    elapse(1_000).await;
    assert_eq!(d.readings().len(), 2);
    elapse(1_500).await;
    assert_eq!(d.readings().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_launch_autostarts_simulation() {
    let config = TemperatureConfig { seed: Some(11), ..TemperatureConfig::default() };
    let d = TemperatureDashboard::launch(&config).unwrap();
    assert!(d.is_running());
    let mut history = d.subscribe();
    history.changed().await.unwrap();
    let snapshot = d.snapshot();
    assert_eq!(snapshot.readings.len(), 1);
    assert!((65.0..85.0).contains(&snapshot.current));
    assert_eq!(snapshot.min, snapshot.max);
}

#[tokio::test(start_paused = true)]
async fn test_launch_respects_autostart_off() {
    let config = TemperatureConfig { autostart: false, ..TemperatureConfig::default() };
    let d = TemperatureDashboard::launch(&config).unwrap();
    assert!(!d.is_running());
    elapse(10_000).await;
    assert!(d.readings().is_empty());
}

proptest! {
    #[test]
    fn prop_history_invariants(values in proptest::collection::vec(-100.0f32..200.0, 1..60)) {
        let mut history = ReadingHistory::new(20);
        for v in &values {
            history.push(Reading { value: *v, timestamp: String::new() });
        }
        prop_assert_eq!(history.len(), values.len().min(20));
        prop_assert_eq!(history.current(), *values.last().unwrap());
        prop_assert!(history.min() <= history.average());
        prop_assert!(history.average() <= history.max());
        let kept: Vec<f32> = history.values().collect();
        let expected: Vec<f32> = values.iter().rev().take(20).copied().collect();
        prop_assert_eq!(kept, expected);
    }
}
