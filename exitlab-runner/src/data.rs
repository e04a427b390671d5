//! Bar ingestion: CSV loading and synthetic data generation.
//!
//! The loader validates what the simulator assumes: strictly increasing
//! unique timestamps and sane OHLC ranges. The synthetic generator exists
//! for tests and offline demos — a seeded random walk with plausible
//! intrabar ranges.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use exitlab_core::Bar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d"];

/// Errors from bar ingestion.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },
    #[error("row {row}: timestamps must be strictly increasing")]
    OutOfOrder { row: usize },
    #[error("row {row}: OHLC values out of range")]
    InsaneBar { row: usize },
    #[error("no data rows in file")]
    Empty,
}

/// Raw CSV row with the conventional exported-chart header.
#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "Datetime")]
    datetime: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume", default)]
    volume: f64,
}

/// Load and validate a bar series from a CSV file.
pub fn load_bars(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut bars: Vec<Bar> = Vec::new();

    for (i, record) in reader.deserialize::<RawBar>().enumerate() {
        let row = i + 2; // 1-based, after the header line
        let raw = record?;
        let timestamp = parse_timestamp(&raw.datetime).ok_or_else(|| LoadError::Timestamp {
            row,
            value: raw.datetime.clone(),
        })?;

        let bar = Bar {
            timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        };
        if !bar.is_sane() {
            return Err(LoadError::InsaneBar { row });
        }
        if let Some(prev) = bars.last() {
            if bar.timestamp <= prev.timestamp {
                return Err(LoadError::OutOfOrder { row });
            }
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(bars)
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Seeded random-walk hourly bars for tests and offline demos.
///
/// Identical `(count, seed)` inputs produce identical series.
pub fn synthetic_bars(count: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut close = 100.0f64;
    let mut bars = Vec::with_capacity(count);

    for i in 0..count {
        let open = close;
        let step: f64 = rng.gen_range(-0.004..0.004);
        close = (open * (1.0 + step)).max(0.01);
        let wick_up: f64 = rng.gen_range(0.0..0.002);
        let wick_down: f64 = rng.gen_range(0.0..0.002);
        bars.push(Bar {
            timestamp: base + chrono::Duration::hours(i as i64),
            open,
            high: open.max(close) * (1.0 + wick_up),
            low: open.min(close) * (1.0 - wick_down),
            close,
            volume: rng.gen_range(500.0..5000.0),
        });
    }
    bars
}
