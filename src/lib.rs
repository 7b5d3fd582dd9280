//! tickboard: periodic-update state controllers for three small apps.
//!
//! - [`counter::Counter`]: integer counter with optional auto-increment.
//! - [`temperature::TemperatureDashboard`]: simulated readings with rolling statistics.
//! - [`lifecycle::LifeTracker`]: append-on-notify lifecycle event log.
//!
//! All three sit on [`state::ObservableState`]; the timed ones on
//! [`controller::PeriodicController`].

pub mod clock;
pub mod config;
pub mod controller;
pub mod counter;
pub mod lifecycle;
pub mod render;
pub mod state;
pub mod temperature;

pub use config::{load_config, Config, ConfigError};
pub use controller::{ControllerError, ControllerState, PeriodicController, TickMutation};
pub use counter::Counter;
pub use lifecycle::{ColorTag, LifeTracker, LifecycleEvent, LogEntry};
pub use state::{ObservableState, StateReceiver};
pub use temperature::{Reading, ReadingHistory, TemperatureDashboard};
