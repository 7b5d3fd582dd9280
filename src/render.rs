// src/render.rs - Plain-text views over app snapshots
use crate::counter::CounterSnapshot;
use crate::lifecycle::LogEntry;
use crate::temperature::DashboardSnapshot;

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

fn whole_degrees(value: f32) -> i64 {
    value.round() as i64
}

pub fn counter(snapshot: &CounterSnapshot) -> String {
    format!(
        "Count: {}\nAuto mode: {} (every {}s)",
        snapshot.count,
        on_off(snapshot.auto_mode),
        snapshot.interval_secs
    )
}

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One bar per value, in the given order, scaled between the series' min and max.
/// A flat series sits on the bottom row; an empty one draws nothing.
pub fn chart(values: &[f32]) -> String {
    let Some(min) = values.iter().copied().reduce(f32::min) else {
        return String::new();
    };
    let max = values.iter().copied().fold(min, f32::max);
    let top = (BARS.len() - 1) as f32;
    values
        .iter()
        .map(|v| {
            let level = if max == min { 0.0 } else { ((v - min) / (max - min) * top).round() };
            BARS[level.clamp(0.0, top) as usize]
        })
        .collect()
}

pub fn dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut out = format!(
        "Current: {}°F\nAvg: {}°F\nMin: {}°F\nMax: {}°F\n",
        whole_degrees(snapshot.current),
        whole_degrees(snapshot.average),
        whole_degrees(snapshot.min),
        whole_degrees(snapshot.max),
    );
    let values: Vec<f32> = snapshot.readings.iter().map(|r| r.value).collect();
    if !values.is_empty() {
        out.push_str(&chart(&values));
        out.push('\n');
    }
    for reading in &snapshot.readings {
        out.push_str(&format!("{} — {:.1}°F\n", reading.timestamp, reading.value));
    }
    out.push_str(if snapshot.running { "[Pause]" } else { "[Resume]" });
    out
}

pub fn lifecycle(entries: &[LogEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("#{:08X} {} {}\n", entry.color.argb(), entry.event_name, entry.timestamp));
    }
    if let Some(latest) = entries.first() {
        out.push_str(&format!("Lifecycle changed: {}", latest.event_name));
    }
    out
}
