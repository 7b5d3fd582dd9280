//! Lifecycle event logger.
//!
//! Unlike the counter and the dashboard this log has no timer: entries are prepended
//! when the host reports a lifecycle transition. The log is unbounded.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::LifeTrackerConfig;
use crate::state::{ObservableState, StateReceiver};

/// Raw name recorded at launch, before any observer is attached.
pub const LAUNCH_EVENT: &str = "onCreate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LifecycleEvent {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
    /// Catch-all emitted alongside every transition; never logged.
    Any,
}

impl LifecycleEvent {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleEvent::Create => "ON_CREATE",
            LifecycleEvent::Start => "ON_START",
            LifecycleEvent::Resume => "ON_RESUME",
            LifecycleEvent::Pause => "ON_PAUSE",
            LifecycleEvent::Stop => "ON_STOP",
            LifecycleEvent::Destroy => "ON_DESTROY",
            LifecycleEvent::Any => "ON_ANY",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lifecycle event '{0}'")]
pub struct UnknownEvent(pub String);

impl FromStr for LifecycleEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ON_CREATE" => Ok(LifecycleEvent::Create),
            "ON_START" => Ok(LifecycleEvent::Start),
            "ON_RESUME" => Ok(LifecycleEvent::Resume),
            "ON_PAUSE" => Ok(LifecycleEvent::Pause),
            "ON_STOP" => Ok(LifecycleEvent::Stop),
            "ON_DESTROY" => Ok(LifecycleEvent::Destroy),
            "ON_ANY" => Ok(LifecycleEvent::Any),
            other => Err(UnknownEvent(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorTag {
    Blue,
    Green,
    Yellow,
    Orange,
    Red,
    Grey,
    /// Fallback for names outside the known set.
    Gray,
}

impl ColorTag {
    pub fn for_event(name: &str) -> Self {
        match name {
            "ON_CREATE" => ColorTag::Blue,
            "ON_START" => ColorTag::Green,
            "ON_RESUME" => ColorTag::Yellow,
            "ON_PAUSE" => ColorTag::Orange,
            "ON_STOP" => ColorTag::Red,
            "ON_DESTROY" => ColorTag::Grey,
            _ => ColorTag::Gray,
        }
    }

    /// Display color as `0xAARRGGBB`.
    pub fn argb(self) -> u32 {
        match self {
            ColorTag::Blue => 0xFF64B5F6,
            ColorTag::Green => 0xFF81C784,
            ColorTag::Yellow => 0xFFFFF176,
            ColorTag::Orange => 0xFFFFB74D,
            ColorTag::Red => 0xFFE57373,
            ColorTag::Grey => 0xFF9E9E9E,
            ColorTag::Gray => 0xFF888888,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub event_name: String,
    pub timestamp: String,
    pub color: ColorTag,
}

pub struct LifeTracker {
    logs: ObservableState<Vec<LogEntry>>,
    clock: Arc<dyn Clock>,
}

impl LifeTracker {
    pub fn new(config: &LifeTrackerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &LifeTrackerConfig, clock: Arc<dyn Clock>) -> Self {
        let tracker = Self {
            logs: ObservableState::new(Vec::new()),
            clock,
        };
        if config.record_launch {
            tracker.add_event(LAUNCH_EVENT);
        }
        tracker
    }

    /// Prepends an entry for `name`, timestamped now.
    pub fn add_event(&self, name: &str) {
        let entry = LogEntry {
            event_name: name.to_string(),
            timestamp: self.clock.timestamp(),
            color: ColorTag::for_event(name),
        };
        tracing::info!("Lifecycle event {} at {}", entry.event_name, entry.timestamp);
        self.logs.mutate(|logs| logs.insert(0, entry));
    }

    /// Observer hook for lifecycle transitions. `ON_ANY` is dropped.
    pub fn observe(&self, event: LifecycleEvent) {
        if event != LifecycleEvent::Any {
            self.add_event(event.name());
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.logs.get()
    }

    pub fn len(&self) -> usize {
        self.logs.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.logs.with(Vec::is_empty)
    }

    /// Name of the most recent entry.
    pub fn latest(&self) -> Option<String> {
        self.logs.with(|logs| logs.first().map(|e| e.event_name.clone()))
    }

    pub fn subscribe(&self) -> StateReceiver<Vec<LogEntry>> {
        self.logs.subscribe()
    }
}
