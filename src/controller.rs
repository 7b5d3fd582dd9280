//! Periodic-update state controller.
//!
//! [`PeriodicController`] owns one observable value, a running flag and a tick period.
//! While running, a single tokio task sleeps for the current period and then applies the
//! controller's [`TickMutation`]. Every `start()` replaces the task, every `stop()` clears
//! it, and a tick only mutates if it still belongs to the live generation.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::state::{ObservableState, StateReceiver};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("period must be positive, got {0} seconds")]
    InvalidPeriod(i64),
    #[error("interval '{0}' is not a whole number of seconds")]
    UnparseableInterval(String),
    #[error("no tokio runtime available to schedule ticks")]
    NoRuntime,
}

/// Mutation applied to the state on every tick.
pub trait TickMutation<T>: Send + Sync + 'static {
    fn on_tick(&self, value: &mut T);
}

impl<T, F> TickMutation<T> for F
where
    F: Fn(&mut T) + Send + Sync + 'static,
{
    fn on_tick(&self, value: &mut T) {
        self(value)
    }
}

/// Point-in-time copy of a controller, for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerState<T> {
    pub value: T,
    pub running: bool,
    pub period_millis: u64,
}

/// Parses the settings-dialog text into a period. Surrounding whitespace is tolerated.
pub fn parse_interval(input: &str) -> Result<Duration, ControllerError> {
    let trimmed = input.trim();
    let secs: i64 = trimmed
        .parse()
        .map_err(|_| ControllerError::UnparseableInterval(trimmed.to_string()))?;
    period_from_secs(secs)
}

fn period_from_secs(secs: i64) -> Result<Duration, ControllerError> {
    if secs <= 0 {
        return Err(ControllerError::InvalidPeriod(secs));
    }
    Ok(Duration::from_secs(secs as u64))
}

/// Everything a tick task needs, shared with the controller.
struct TickShared<T> {
    name: &'static str,
    state: ObservableState<T>,
    running: ObservableState<bool>,
    period_ms: Arc<AtomicU64>,
    generation: Arc<AtomicU64>,
    tick: Arc<dyn TickMutation<T>>,
}

impl<T> TickShared<T>
where
    T: Send + Sync + 'static,
{
    fn is_live(&self, generation: u64) -> bool {
        self.running.with(|running| *running) && self.generation.load(Ordering::Acquire) == generation
    }

    fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.load(Ordering::Acquire))
    }

    /// Applies one tick if `generation` is still live, checked under the state lock.
    fn apply_tick(&self, generation: u64) -> bool {
        self.state.mutate_if(|value| {
            if !self.is_live(generation) {
                return false;
            }
            self.tick.on_tick(value);
            true
        })
    }
}

struct TickTask {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct PeriodicController<T> {
    name: &'static str,
    state: ObservableState<T>,
    running: ObservableState<bool>,
    period_ms: Arc<AtomicU64>,
    generation: Arc<AtomicU64>,
    tick: Arc<dyn TickMutation<T>>,
    task: Option<TickTask>,
    runtime: Option<Handle>,
}

impl<T> PeriodicController<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a stopped controller. `name` only labels log lines.
    pub fn new<M>(name: &'static str, initial: T, period: Duration, tick: M) -> Self
    where
        M: TickMutation<T>,
    {
        Self {
            name,
            state: ObservableState::new(initial),
            running: ObservableState::new(false),
            period_ms: Arc::new(AtomicU64::new(period.as_millis().max(1) as u64)),
            generation: Arc::new(AtomicU64::new(0)),
            tick: Arc::new(tick),
            task: None,
            runtime: None,
        }
    }

    /// Pins tick tasks to `handle` instead of the runtime current at `start()`.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mutate_now<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        self.state.mutate(f);
    }

    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.state.with(f)
    }

    pub fn subscribe(&self) -> StateReceiver<T> {
        self.state.subscribe()
    }

    pub fn subscribe_running(&self) -> StateReceiver<bool> {
        self.running.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.with(|running| *running)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.load(Ordering::Acquire))
    }

    /// Changes the period used from the next scheduled tick on.
    pub fn set_period(&mut self, period: Duration) -> Result<(), ControllerError> {
        let millis = period.as_millis();
        if millis == 0 {
            return Err(ControllerError::InvalidPeriod(0));
        }
        self.period_ms.store(millis.min(u64::MAX as u128) as u64, Ordering::Release);
        tracing::debug!(controller = self.name, period_ms = millis as u64, "period updated");
        Ok(())
    }

    pub fn set_period_secs(&mut self, secs: i64) -> Result<(), ControllerError> {
        self.set_period(period_from_secs(secs)?)
    }

    /// Starts ticking. Any task already running is cancelled first.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        let runtime = match &self.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| ControllerError::NoRuntime)?,
        };
        self.cancel_task();
        self.running.set(true);

        let generation = self.generation.load(Ordering::Acquire);
        let shared = TickShared {
            name: self.name,
            state: self.state.clone(),
            running: self.running.clone(),
            period_ms: self.period_ms.clone(),
            generation: self.generation.clone(),
            tick: self.tick.clone(),
        };
        let handle = runtime.spawn(run_ticks(generation, shared));
        self.task = Some(TickTask { generation, handle });
        tracing::info!(controller = self.name, period_ms = self.period().as_millis() as u64, "started");
        Ok(())
    }

    pub fn stop(&mut self) {
        let was_running = self.running.set(false);
        self.cancel_task();
        if was_running {
            tracing::info!(controller = self.name, "stopped");
        }
    }

    /// Flips the running flag. Returns the new state.
    pub fn toggle(&mut self) -> Result<bool, ControllerError> {
        if self.is_running() {
            self.stop();
            Ok(false)
        } else {
            self.start()?;
            Ok(true)
        }
    }

    /// Aborts the live task and retires its generation so a tick that is already
    /// scheduled can no longer mutate.
    fn cancel_task(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.task.take() {
            task.handle.abort();
            tracing::debug!(controller = self.name, generation = task.generation, "tick task cancelled");
        }
    }
}

impl<T> PeriodicController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn value(&self) -> T {
        self.state.get()
    }

    pub fn snapshot(&self) -> ControllerState<T> {
        ControllerState {
            value: self.value(),
            running: self.is_running(),
            period_millis: self.period_ms.load(Ordering::Acquire),
        }
    }
}

impl<T> Drop for PeriodicController<T> {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.task.take() {
            task.handle.abort();
        }
    }
}

async fn run_ticks<T>(generation: u64, shared: TickShared<T>)
where
    T: Send + Sync + 'static,
{
    while shared.is_live(generation) {
        tokio::time::sleep(shared.period()).await;
        if !shared.apply_tick(generation) {
            tracing::debug!(controller = shared.name, generation, "stale tick dropped");
            break;
        }
        tracing::trace!(controller = shared.name, generation, "tick");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(period: Duration) -> PeriodicController<i64> {
        PeriodicController::new("test", 0, period, |v: &mut i64| *v += 1)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("5"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_interval(" 2 "), Ok(Duration::from_secs(2)));
        assert_eq!(parse_interval("0"), Err(ControllerError::InvalidPeriod(0)));
        assert_eq!(parse_interval("-3"), Err(ControllerError::InvalidPeriod(-3)));
        assert!(matches!(parse_interval("abc"), Err(ControllerError::UnparseableInterval(_))));
        assert!(matches!(parse_interval("1.5"), Err(ControllerError::UnparseableInterval(_))));
        assert!(matches!(parse_interval(""), Err(ControllerError::UnparseableInterval(_))));
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let mut c = counter(Duration::from_secs(1));
        assert_eq!(c.start(), Err(ControllerError::NoRuntime));
        assert!(!c.is_running());
    }

    #[test]
    fn test_start_on_pinned_runtime() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let mut c = counter(Duration::from_millis(10)).with_runtime(rt.handle().clone());
        c.start().unwrap();
        assert!(c.is_running());
        rt.block_on(async { tokio::time::sleep(Duration::from_millis(35)).await });
        c.stop();
        let ticks = c.value();
        assert!(ticks >= 1, "expected ticks, got {ticks}");
        rt.block_on(async { tokio::time::sleep(Duration::from_millis(30)).await });
        assert_eq!(c.value(), ticks);
    }

    fn shared_for(c: &PeriodicController<i64>) -> TickShared<i64> {
        TickShared {
            name: c.name,
            state: c.state.clone(),
            running: c.running.clone(),
            period_ms: c.period_ms.clone(),
            generation: c.generation.clone(),
            tick: c.tick.clone(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retired_generation_cannot_mutate() {
        let mut c = counter(Duration::from_secs(60));
        c.start().unwrap();
        let live = c.generation.load(Ordering::Acquire);
        let shared = shared_for(&c);
        assert!(shared.apply_tick(live));
        assert_eq!(c.value(), 1);

        // A restart retires the old generation even though running stays true.
        c.start().unwrap();
        assert!(!shared.apply_tick(live));
        assert_eq!(c.value(), 1);

        let current = c.generation.load(Ordering::Acquire);
        c.stop();
        assert!(!shared.apply_tick(current));
        assert_eq!(c.value(), 1);
    }

    #[test]
    fn test_invalid_period_keeps_previous() {
        let mut c = counter(Duration::from_secs(3));
        assert!(c.set_period_secs(0).is_err());
        assert!(c.set_period_secs(-1).is_err());
        assert!(c.set_period(Duration::ZERO).is_err());
        assert_eq!(c.period(), Duration::from_secs(3));
        c.set_period_secs(7).unwrap();
        assert_eq!(c.period(), Duration::from_secs(7));
    }

    #[test]
    fn test_mutate_now_and_snapshot() {
        let c = counter(Duration::from_millis(250));
        c.mutate_now(|v| *v -= 4);
        let snap = c.snapshot();
        assert_eq!(snap.value, -4);
        assert!(!snap.running);
        assert_eq!(snap.period_millis, 250);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let mut c = counter(Duration::from_secs(1));
        c.start().unwrap();
        advance(3500).await;
        assert_eq!(c.value(), 3);
        assert!(c.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let mut c = counter(Duration::from_secs(1));
        c.start().unwrap();
        advance(2500).await;
        c.stop();
        c.stop();
        advance(5000).await;
        assert_eq!(c.value(), 2);
        assert!(!c.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_elapsed_time() {
        let mut c = counter(Duration::from_secs(1));
        c.start().unwrap();
        advance(1500).await;
        assert_eq!(c.value(), 1);
        // Without the restart a tick would land at 2.0s.
        c.start().unwrap();
        advance(700).await;
        assert_eq!(c.value(), 1);
        advance(400).await;
        assert_eq!(c.value(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_start_never_doubles_ticks() {
        let mut c = counter(Duration::from_secs(1));
        for _ in 0..5 {
            c.start().unwrap();
        }
        advance(4500).await;
        assert_eq!(c.value(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_period_change_applies_from_next_tick() {
        let mut c = counter(Duration::from_secs(1));
        c.start().unwrap();
        advance(500).await;
        c.set_period_secs(3).unwrap();
        // The sleep in flight still ends at 1s, the next one at 4s.
        advance(1000).await;
        assert_eq!(c.value(), 1);
        advance(2000).await;
        assert_eq!(c.value(), 1);
        advance(1000).await;
        assert_eq!(c.value(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_flips_running() {
        let mut c = counter(Duration::from_secs(1));
        let mut running = c.subscribe_running();
        assert!(c.toggle().unwrap());
        assert!(running.has_changed().unwrap());
        assert!(*running.borrow_and_update());
        advance(1500).await;
        assert!(!c.toggle().unwrap());
        assert!(!*running.borrow_and_update());
        advance(3000).await;
        assert_eq!(c.value(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_task() {
        let mut c = counter(Duration::from_secs(1));
        let rx = c.subscribe();
        c.start().unwrap();
        advance(1500).await;
        drop(c);
        advance(5000).await;
        assert_eq!(*rx.borrow(), 1);
    }
}
