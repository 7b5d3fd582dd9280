// src/counter.rs - Counter with optional timed auto-increment
use serde::Serialize;
use std::time::Duration;

use crate::config::CounterConfig;
use crate::controller::{parse_interval, ControllerError, PeriodicController};
use crate::state::StateReceiver;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterSnapshot {
    pub count: i64,
    pub auto_mode: bool,
    pub interval_secs: u64,
}

pub struct Counter {
    controller: PeriodicController<i64>,
}

impl Counter {
    pub fn new(config: &CounterConfig) -> Self {
        let period = Duration::from_secs(config.interval_secs.max(1));
        Self {
            controller: PeriodicController::new("counter", 0, period, |count: &mut i64| *count += 1),
        }
    }

    pub fn increment(&self) {
        self.controller.mutate_now(|count| *count += 1);
    }

    pub fn decrement(&self) {
        self.controller.mutate_now(|count| *count -= 1);
    }

    pub fn reset(&self) {
        self.controller.mutate_now(|count| *count = 0);
    }

    pub fn count(&self) -> i64 {
        self.controller.value()
    }

    pub fn auto_mode(&self) -> bool {
        self.controller.is_running()
    }

    /// Turns auto-increment on or off. Returns the new mode.
    pub fn toggle_auto(&mut self) -> Result<bool, ControllerError> {
        self.controller.toggle()
    }

    pub fn set_interval(&mut self, seconds: i64) -> Result<(), ControllerError> {
        self.controller.set_period_secs(seconds)
    }

    /// Applies raw settings text. Bad input is logged and the previous interval stays.
    pub fn set_interval_input(&mut self, input: &str) -> Result<(), ControllerError> {
        let period = parse_interval(input).inspect_err(|e| {
            tracing::warn!("Ignoring interval input: {}", e);
        })?;
        self.controller.set_period(period)
    }

    pub fn interval_seconds(&self) -> u64 {
        self.controller.period().as_secs()
    }

    pub fn subscribe(&self) -> StateReceiver<i64> {
        self.controller.subscribe()
    }

    pub fn subscribe_auto_mode(&self) -> StateReceiver<bool> {
        self.controller.subscribe_running()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            count: self.count(),
            auto_mode: self.auto_mode(),
            interval_secs: self.interval_seconds(),
        }
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new(&CounterConfig::default())
    }
}
