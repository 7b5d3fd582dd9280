// src/main.rs - Headless terminal driver for the three apps
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;

use tickboard::config::{self, Config, ConfigError};
use tickboard::counter::Counter;
use tickboard::lifecycle::{LifeTracker, LifecycleEvent};
use tickboard::render;
use tickboard::temperature::TemperatureDashboard;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Parser)]
#[command(name = "tickboard", version, about = "Counter, lifecycle log and temperature dashboard")]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist.
    #[arg(short, long, default_value = "tickboard.toml")]
    config: PathBuf,
    /// Log at DEBUG instead of INFO.
    #[arg(short, long)]
    verbose: bool,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    #[command(subcommand)]
    app: App,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum App {
    /// Counter with optional auto-increment.
    Counter {
        /// Seconds to keep running.
        #[arg(long, default_value_t = 10)]
        duration: u64,
        /// Turn auto mode on at launch.
        #[arg(long)]
        auto: bool,
        /// Interval text as typed into the settings dialog; bad input is ignored.
        #[arg(long)]
        interval: Option<String>,
        /// Button presses applied at launch: inc, dec, reset, toggle.
        #[arg(long, value_delimiter = ',')]
        press: Vec<String>,
    },
    /// Simulated temperature dashboard.
    Temperature {
        #[arg(long, default_value_t = 10)]
        duration: u64,
        /// Press Pause after this many seconds.
        #[arg(long)]
        pause_after: Option<u64>,
    },
    /// Replay lifecycle transitions into the event log.
    Lifetracker {
        #[arg(long, value_delimiter = ',', default_value = "ON_CREATE,ON_START,ON_RESUME")]
        events: Vec<String>,
    },
}

fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    match config::load_config(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("No config at '{}', using defaults", path.display());
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}

fn emit<T: Serialize>(format: Format, snapshot: &T, text: impl FnOnce(&T) -> String) -> Result<(), BoxError> {
    match format {
        Format::Text => println!("{}\n", text(snapshot)),
        Format::Json => println!("{}", serde_json::to_string(snapshot)?),
    }
    Ok(())
}

async fn run_counter(
    config: &Config,
    format: Format,
    duration: u64,
    auto: bool,
    interval: Option<String>,
    press: Vec<String>,
) -> Result<(), BoxError> {
    let mut counter = Counter::new(&config.counter);
    if let Some(input) = interval {
        // Lenient: a rejected value keeps the configured interval.
        let _ = counter.set_interval_input(&input);
    }
    for button in &press {
        match button.as_str() {
            "inc" => counter.increment(),
            "dec" => counter.decrement(),
            "reset" => counter.reset(),
            "toggle" => {
                counter.toggle_auto()?;
            }
            other => tracing::warn!("Unknown button '{}'", other),
        }
    }
    if auto && !counter.auto_mode() {
        counter.toggle_auto()?;
    }

    let mut values = counter.subscribe();
    let deadline = sleep(Duration::from_secs(duration));
    tokio::pin!(deadline);
    emit(format, &counter.snapshot(), render::counter)?;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = values.changed() => {
                if changed.is_err() {
                    break;
                }
                emit(format, &counter.snapshot(), render::counter)?;
            }
        }
    }
    if counter.auto_mode() {
        counter.toggle_auto()?;
    }
    Ok(())
}

async fn run_temperature(
    config: &Config,
    format: Format,
    duration: u64,
    pause_after: Option<u64>,
) -> Result<(), BoxError> {
    let mut dashboard = TemperatureDashboard::launch(&config.temperature)?;
    let mut history = dashboard.subscribe();
    let deadline = sleep(Duration::from_secs(duration));
    let pause = sleep(Duration::from_secs(pause_after.unwrap_or(duration)));
    tokio::pin!(deadline, pause);
    let mut pause_pending = pause_after.is_some();
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut pause, if pause_pending => {
                pause_pending = false;
                if dashboard.is_running() {
                    dashboard.toggle_running()?;
                }
                emit(format, &dashboard.snapshot(), render::dashboard)?;
            }
            changed = history.changed() => {
                if changed.is_err() {
                    break;
                }
                emit(format, &dashboard.snapshot(), render::dashboard)?;
            }
        }
    }
    dashboard.stop();
    Ok(())
}

fn run_lifetracker(config: &Config, format: Format, events: Vec<String>) -> Result<(), BoxError> {
    let tracker = LifeTracker::new(&config.lifetracker);
    for name in &events {
        match name.parse::<LifecycleEvent>() {
            Ok(event) => tracker.observe(event),
            Err(e) => tracing::warn!("Skipping transition: {}", e),
        }
    }
    let entries = tracker.entries();
    emit(format, &entries, |entries| render::lifecycle(entries))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_or_default(&cli.config)?;

    match cli.app {
        App::Counter { duration, auto, interval, press } => {
            run_counter(&config, cli.format, duration, auto, interval, press).await
        }
        App::Temperature { duration, pause_after } => {
            run_temperature(&config, cli.format, duration, pause_after).await
        }
        App::Lifetracker { events } => run_lifetracker(&config, cli.format, events),
    }
}
