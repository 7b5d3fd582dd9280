// src/temperature.rs - Simulated temperature dashboard
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::TemperatureConfig;
use crate::controller::{ControllerError, PeriodicController};
use crate::state::StateReceiver;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub value: f32,
    pub timestamp: String,
}

/// Most-recent-first readings, capped by count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingHistory {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl ReadingHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepends `reading`, evicting the oldest entries past capacity.
    pub fn push(&mut self, reading: Reading) {
        self.readings.push_front(reading);
        self.readings.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.readings.iter().map(|r| r.value)
    }

    pub fn current(&self) -> f32 {
        self.readings.front().map_or(0.0, |r| r.value)
    }

    pub fn average(&self) -> f32 {
        if self.readings.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values().map(f64::from).sum();
        (sum / self.readings.len() as f64) as f32
    }

    pub fn min(&self) -> f32 {
        self.values().reduce(f32::min).unwrap_or(0.0)
    }

    pub fn max(&self) -> f32 {
        self.values().reduce(f32::max).unwrap_or(0.0)
    }
}

/// Source of synthetic sensor values.
pub trait ReadingSource: Send + Sync {
    fn sample(&self) -> f32;
}

/// Uniform values in `[min, max)`.
pub struct SimulatedSensor {
    min: f32,
    max: f32,
    rng: Mutex<StdRng>,
}

impl SimulatedSensor {
    pub fn new(min: f32, max: f32) -> Self {
        Self::with_rng(min, max, StdRng::from_os_rng())
    }

    pub fn seeded(min: f32, max: f32, seed: u64) -> Self {
        Self::with_rng(min, max, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min: f32, max: f32, rng: StdRng) -> Self {
        Self { min, max, rng: Mutex::new(rng) }
    }
}

impl ReadingSource for SimulatedSensor {
    fn sample(&self) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(self.min..self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub running: bool,
    pub current: f32,
    pub average: f32,
    pub min: f32,
    pub max: f32,
    pub readings: Vec<Reading>,
}

pub struct TemperatureDashboard {
    controller: PeriodicController<ReadingHistory>,
    clock: Arc<dyn Clock>,
}

impl TemperatureDashboard {
    /// Builds a stopped dashboard fed by `source`.
    pub fn new(config: &TemperatureConfig, source: Arc<dyn ReadingSource>, clock: Arc<dyn Clock>) -> Self {
        let period = Duration::from_secs(config.period_secs.max(1));
        let tick_clock = clock.clone();
        let controller = PeriodicController::new(
            "temperature",
            ReadingHistory::new(config.history_capacity),
            period,
            move |history: &mut ReadingHistory| {
                let reading = Reading {
                    value: source.sample(),
                    timestamp: tick_clock.timestamp(),
                };
                tracing::debug!("Simulated reading: {:.1}°F at {}", reading.value, reading.timestamp);
                history.push(reading);
            },
        );
        Self { controller, clock }
    }

    /// Builds a dashboard with the simulated sensor from `config` and starts it when
    /// `config.autostart` is set.
    pub fn launch(config: &TemperatureConfig) -> Result<Self, ControllerError> {
        let sensor = match config.seed {
            Some(seed) => SimulatedSensor::seeded(config.min_value, config.max_value, seed),
            None => SimulatedSensor::new(config.min_value, config.max_value),
        };
        let mut dashboard = Self::new(config, Arc::new(sensor), Arc::new(SystemClock));
        if config.autostart {
            dashboard.controller.start()?;
        }
        Ok(dashboard)
    }

    pub fn start(&mut self) -> Result<(), ControllerError> {
        self.controller.start()
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    /// Pause/resume. Returns whether the simulation now runs.
    pub fn toggle_running(&mut self) -> Result<bool, ControllerError> {
        self.controller.toggle()
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Prepends a reading taken now, outside the tick schedule.
    pub fn record(&self, value: f32) {
        let reading = Reading {
            value,
            timestamp: self.clock.timestamp(),
        };
        self.controller.mutate_now(|history| history.push(reading));
    }

    pub fn current(&self) -> f32 {
        self.controller.with_value(ReadingHistory::current)
    }

    pub fn average(&self) -> f32 {
        self.controller.with_value(ReadingHistory::average)
    }

    pub fn min(&self) -> f32 {
        self.controller.with_value(ReadingHistory::min)
    }

    pub fn max(&self) -> f32 {
        self.controller.with_value(ReadingHistory::max)
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.controller.with_value(|history| history.iter().cloned().collect())
    }

    pub fn subscribe(&self) -> StateReceiver<ReadingHistory> {
        self.controller.subscribe()
    }

    pub fn subscribe_running(&self) -> StateReceiver<bool> {
        self.controller.subscribe_running()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.controller.with_value(|history| DashboardSnapshot {
            running: self.controller.is_running(),
            current: history.current(),
            average: history.average(),
            min: history.min(),
            max: history.max(),
            readings: history.iter().cloned().collect(),
        })
    }
}
