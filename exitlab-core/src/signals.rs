//! Entry-signal generation: trend + band-touch trigger + volatility regime.
//!
//! A signal is a per-bar integer in {-1, 0, +1}. Signals are derived columns:
//! the simulator treats them as read-only input and never deduplicates
//! consecutive entries — each non-zero bar is an independent candidate trade.

use crate::domain::{Bar, Session};
use crate::indicators::IndicatorSet;

/// Upper bound of the volatility regime, as a multiple of the lower bound.
const VOL_BAND_WIDTH: f64 = 3.0;

/// Generate entry signals over a bar series.
///
/// Long: price above the trend MA with the MA stack trending up
/// (fast > slow > trend), price at or below the lower Bollinger band, ATR
/// inside the normal-volatility band, and not in the deadzone session.
/// Short is the mirror image against the upper band.
///
/// NaN indicator values (warmup) never fire a signal — every comparison
/// against NaN is false.
pub fn entry_signals(bars: &[Bar], ind: &IndicatorSet, range_atr_filter: f64) -> Vec<i8> {
    let n = bars.len();
    let mut signals = vec![0i8; n];

    for i in 0..n {
        if bars[i].session() == Session::Deadzone {
            continue;
        }

        let atr = ind.atr[i];
        let floor = range_atr_filter * ind.atr_mean[i];
        let normal_vol = atr >= floor && atr <= VOL_BAND_WIDTH * floor;
        if !normal_vol {
            continue;
        }

        let price = bars[i].close;
        let long_trend = price > ind.sma_trend[i]
            && ind.sma_slow[i] > ind.sma_trend[i]
            && ind.sma_fast[i] > ind.sma_slow[i];
        let short_trend = price < ind.sma_trend[i]
            && ind.sma_slow[i] < ind.sma_trend[i]
            && ind.sma_fast[i] < ind.sma_slow[i];

        if long_trend && price <= ind.bb_lower[i] {
            signals[i] = 1;
        } else if short_trend && price >= ind.bb_upper[i] {
            signals[i] = -1;
        }
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn bar_at_hour(hour: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000.0,
        }
    }

    /// Hand-built indicator set where every column is a constant.
    fn constant_ind(n: usize, price: f64) -> IndicatorSet {
        IndicatorSet {
            // Stacked for a long trend: fast > slow > trend, price > trend
            sma_fast: vec![price - 1.0; n],
            sma_slow: vec![price - 2.0; n],
            sma_trend: vec![price - 3.0; n],
            // Price sits exactly on the lower band → long trigger fires
            bb_upper: vec![price + 2.0; n],
            bb_lower: vec![price; n],
            atr: vec![1.0; n],
            atr_mean: vec![1.0; n],
        }
    }

    #[test]
    fn long_signal_fires_when_all_conditions_hold() {
        let bars = vec![bar_at_hour(11, 100.0)];
        let ind = constant_ind(1, 100.0);
        assert_eq!(entry_signals(&bars, &ind, 0.8), vec![1]);
    }

    #[test]
    fn deadzone_suppresses_entry() {
        let bars = vec![bar_at_hour(1, 100.0)];
        let ind = constant_ind(1, 100.0);
        assert_eq!(entry_signals(&bars, &ind, 0.8), vec![0]);
    }

    #[test]
    fn low_volatility_suppresses_entry() {
        let bars = vec![bar_at_hour(11, 100.0)];
        let mut ind = constant_ind(1, 100.0);
        ind.atr = vec![0.1]; // below 0.8 × atr_mean
        assert_eq!(entry_signals(&bars, &ind, 0.8), vec![0]);
    }

    #[test]
    fn excessive_volatility_suppresses_entry() {
        let bars = vec![bar_at_hour(11, 100.0)];
        let mut ind = constant_ind(1, 100.0);
        ind.atr = vec![5.0]; // above 3 × 0.8 × atr_mean
        assert_eq!(entry_signals(&bars, &ind, 0.8), vec![0]);
    }

    #[test]
    fn nan_warmup_never_fires() {
        let bars = vec![bar_at_hour(11, 100.0)];
        let mut ind = constant_ind(1, 100.0);
        ind.sma_trend = vec![f64::NAN];
        assert_eq!(entry_signals(&bars, &ind, 0.8), vec![0]);
    }

    #[test]
    fn short_signal_mirrors_long() {
        let bars = vec![bar_at_hour(16, 100.0)];
        let ind = IndicatorSet {
            sma_fast: vec![101.0],
            sma_slow: vec![102.0],
            sma_trend: vec![103.0],
            bb_upper: vec![100.0], // price on the upper band
            bb_lower: vec![98.0],
            atr: vec![1.0],
            atr_mean: vec![1.0],
        };
        assert_eq!(entry_signals(&bars, &ind, 0.8), vec![-1]);
    }

    #[test]
    fn no_trigger_when_price_inside_bands() {
        let bars = vec![bar_at_hour(11, 100.0)];
        let mut ind = constant_ind(1, 100.0);
        ind.bb_lower = vec![99.0]; // price above the band → no touch
        assert_eq!(entry_signals(&bars, &ind, 0.8), vec![0]);
    }
}
