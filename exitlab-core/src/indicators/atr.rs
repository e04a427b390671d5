//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR here is the rolling mean of TR — the volatility measure the exit-level
//! formula multiplies against, not the Wilder-smoothed variant.

use super::sma::sma;
use crate::domain::Bar;

/// Compute the True Range series from bars.
///
/// TR[0] has no previous close and is marked NaN so the averaging window
/// starts from the first proper true range.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];

    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

/// ATR: rolling mean of true range over `period` bars.
///
/// First valid value at index `period` (TR[0] is NaN).
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    sma(&true_range(bars), period)
}
