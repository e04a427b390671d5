//! Indicator columns for signal generation and exit-level derivation.
//!
//! All indicators are precomputed once per parameter set into aligned
//! `Vec<f64>` columns with NaN warmup prefixes. Lookups are typed fields on
//! [`IndicatorSet`] — never string-keyed column names.

pub mod atr;
pub mod bollinger;
pub mod sma;

pub use atr::{atr, true_range};
pub use bollinger::{bollinger, BollingerBands};
pub use sma::{rolling_std, sma};

use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// Which indicator columns to compute, with their window lengths.
///
/// Derived from a parameter set; one spec drives exactly one [`IndicatorSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub sma_trend: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub atr_period: usize,
    /// Window for the rolling mean of ATR used by the volatility filter.
    pub atr_mean_period: usize,
}

/// Precomputed indicator columns, all aligned with the bar series.
///
/// Each optimization trial computes a private set from the shared read-only
/// bars; trials never mutate shared state.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub sma_fast: Vec<f64>,
    pub sma_slow: Vec<f64>,
    pub sma_trend: Vec<f64>,
    pub bb_upper: Vec<f64>,
    pub bb_lower: Vec<f64>,
    pub atr: Vec<f64>,
    /// Rolling mean of the ATR column (volatility-regime reference).
    pub atr_mean: Vec<f64>,
}

impl IndicatorSet {
    /// Compute all columns for the given spec over a bar series.
    pub fn compute(bars: &[Bar], spec: &IndicatorSpec) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let bands = bollinger(&closes, spec.bb_period, spec.bb_std);
        let atr_col = atr(bars, spec.atr_period);
        let atr_mean = sma(&atr_col, spec.atr_mean_period);

        Self {
            sma_fast: sma(&closes, spec.sma_fast),
            sma_slow: sma(&closes, spec.sma_slow),
            sma_trend: sma(&closes, spec.sma_trend),
            bb_upper: bands.upper,
            bb_lower: bands.lower,
            atr: atr_col,
            atr_mean,
        }
    }

    pub fn len(&self) -> usize {
        self.atr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atr.is_empty()
    }
}

/// Create OHLC bars from (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + chrono::Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
