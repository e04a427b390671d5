//! Bollinger bands: rolling mean ± width × rolling standard deviation.

use super::sma::{rolling_std, sma};

/// The three Bollinger columns, aligned with the input closes.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub mid: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Compute Bollinger bands over close prices.
///
/// `width` is the number of standard deviations (commonly 2.0). Warmup
/// prefix of `period - 1` NaN values, same as the underlying SMA.
pub fn bollinger(closes: &[f64], period: usize, width: f64) -> BollingerBands {
    let mid = sma(closes, period);
    let sd = rolling_std(closes, period);

    let upper = mid
        .iter()
        .zip(&sd)
        .map(|(m, s)| m + width * s)
        .collect();
    let lower = mid
        .iter()
        .zip(&sd)
        .map(|(m, s)| m - width * s)
        .collect();

    BollingerBands { mid, upper, lower }
}
