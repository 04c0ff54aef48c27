//! Built-in synthetic sources.
//!
//! Lets a dashboard be pointed at the daemon without any real backend:
//!
//! ```text
//! $default      finder + reader over the configured identifiers
//! sine_wave     reader, hourly samples, target text is the frequency
//! cosine_wave   reader, same shape
//! midnights     annotation reader, one event per UTC midnight
//! sine_wave     panel reader, JSON summary of the wave
//! ```

use std::f64::consts::TAU;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use gridsource_core::config::DemoConfig;
use gridsource_core::{Aggregation, MetricPathIndex, Panel, TimeRange, TimeSeries};
use gridsource_registry::{Capability, DEFAULT_SOURCE, MetricSource, Registry, SourceFuture};
use serde_json::json;
use tracing::{debug, info};

/// Generated series never exceed this many points; the step widens instead.
const MAX_POINTS: i64 = 10_000;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Register every demo source on `registry`.
pub fn register(registry: &Registry, config: &DemoConfig) {
    registry.set_metrics(config.metrics.iter().cloned());

    let source = DemoSource {
        index: registry.index(),
        step_ms: (config.step_secs.max(1) * 1_000) as i64,
        aggregation: config.aggregation,
    };
    registry.register(DEFAULT_SOURCE, Arc::new(source));

    registry.register_reader("sine_wave", |target: &str, range: TimeRange| {
        wave(target, range, f64::sin)
    });
    registry.register_reader("cosine_wave", |target: &str, range: TimeRange| {
        wave(target, range, f64::cos)
    });
    registry.register_annotation_reader("midnights", |query: &str, range: TimeRange| {
        midnights(query, range)
    });
    registry.register_panel_reader("sine_wave", |target: &str, range: TimeRange| {
        wave_summary(target, range)
    });

    info!(
        metrics = config.metrics.len(),
        aggregation = %config.aggregation,
        "demo sources registered"
    );
}

// ── $default ───────────────────────────────────────────────────

/// Serves the configured identifiers with a slow daily swing around a
/// per-metric baseline.
struct DemoSource {
    index: Arc<MetricPathIndex>,
    step_ms: i64,
    aggregation: Aggregation,
}

impl DemoSource {
    fn series(&self, target: &str, range: TimeRange) -> anyhow::Result<TimeSeries> {
        if !self.index.identifiers().iter().any(|m| m == target) {
            bail!("unknown metric {target:?}");
        }
        let baseline = baseline(target);
        let mut series = TimeSeries::from_points(
            "value",
            grid(range, self.step_ms).map(|ts| {
                let phase = ts.timestamp_millis() as f64 / DAY_MS as f64;
                (ts, baseline + 5.0 * (TAU * phase).sin())
            }),
        );
        series.rename_column("value", target);
        debug!(metric = target, points = series.len(), "demo series");
        Ok(series)
    }
}

impl MetricSource for DemoSource {
    fn supports(&self, capability: Capability) -> bool {
        matches!(capability, Capability::Find | Capability::Read)
    }

    fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    fn find<'a>(&'a self, fragment: &'a str) -> SourceFuture<'a, Vec<String>> {
        let found = self.index.search(fragment);
        Box::pin(async move { Ok(found) })
    }

    fn read<'a>(&'a self, target: &'a str, range: TimeRange) -> SourceFuture<'a, TimeSeries> {
        let result = self.series(target, range);
        Box::pin(async move { Ok(result?) })
    }
}

/// Stable per-identifier offset in `[10, 60)`.
fn baseline(identifier: &str) -> f64 {
    let sum = identifier
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    10.0 + f64::from(sum % 50)
}

/// Epoch-aligned timestamps inside `(after, until]`.
fn grid(range: TimeRange, step_ms: i64) -> impl Iterator<Item = DateTime<Utc>> {
    let after = range.after.timestamp_millis();
    let until = range.until.timestamp_millis();
    let span = (until - after).max(0);
    let step = step_ms.max(span / MAX_POINTS + 1);
    let first = after.div_euclid(step) * step + step;

    (0..)
        .map(move |i| first + i * step)
        .take_while(move |ms| *ms <= until)
        .filter_map(DateTime::from_timestamp_millis)
}

// ── Waves ──────────────────────────────────────────────────────

/// `f(2π · frequency · day_fraction)` sampled hourly; frequency is in
/// cycles per day and defaults to 1.
fn wave(target: &str, range: TimeRange, f: fn(f64) -> f64) -> anyhow::Result<TimeSeries> {
    let frequency = parse_frequency(target)?;
    Ok(TimeSeries::from_points(
        target,
        grid(range, HOUR_MS).map(|ts| {
            let day = ts.timestamp_millis() as f64 / DAY_MS as f64;
            (ts, f(TAU * frequency * day))
        }),
    ))
}

fn parse_frequency(target: &str) -> anyhow::Result<f64> {
    let text = target.trim();
    if text.is_empty() {
        return Ok(1.0);
    }
    text.parse::<f64>()
        .with_context(|| format!("wave frequency must be a number, got {text:?}"))
}

fn wave_summary(target: &str, range: TimeRange) -> anyhow::Result<Panel> {
    let series = wave(target, range, f64::sin)?;
    let values: Vec<f64> = series
        .columns()
        .first()
        .map(|c| c.values.iter().filter_map(|v| v.as_f64()).collect())
        .unwrap_or_default();

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let mean = if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    };

    Ok(Panel::json(&json!({
        "wave": "sine",
        "frequency": parse_frequency(target)?,
        "from": range.after.timestamp_millis(),
        "to": range.until.timestamp_millis(),
        "points": values.len(),
        "min": mean.map(|_| min),
        "max": mean.map(|_| max),
        "mean": mean,
    })))
}

// ── Annotations ────────────────────────────────────────────────

fn midnights(query: &str, range: TimeRange) -> anyhow::Result<TimeSeries> {
    let index: Vec<DateTime<Utc>> = grid(range, DAY_MS).collect();
    let titles = vec!["midnight"; index.len()];
    let texts: Vec<String> = index
        .iter()
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .collect();
    let tags = vec![query.to_string(); index.len()];

    Ok(TimeSeries::new(index)
        .with_column("title", titles)?
        .with_column("text", texts)?
        .with_column("tags", tags)?)
}
