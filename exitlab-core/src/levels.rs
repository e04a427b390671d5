//! Exit-level derivation: stop, target, and breakeven trigger per entry.
//!
//! Levels are computed once at entry time from the entry price and the ATR
//! at the entry bar, and never recomputed. The only later mutation is the
//! simulator replacing the stop with the entry price when the breakeven
//! trigger is reached.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// Multipliers applied to the entry-bar ATR to place the exit levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub sl_multiplier: f64,
    pub tp_multiplier: f64,
    /// Favorable-excursion distance (in ATRs) that arms the breakeven stop.
    /// `None` disables breakeven entirely.
    pub be_multiplier: Option<f64>,
}

/// Stop-loss, take-profit, and optional breakeven-trigger prices for one
/// candidate entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitLevels {
    pub stop: f64,
    pub target: f64,
    pub breakeven: Option<f64>,
}

impl ExitLevels {
    /// Place levels around an entry price given the ATR at the entry bar.
    ///
    /// `direction` is +1 for long, -1 for short: stops go against the trade,
    /// targets and breakeven triggers with it.
    pub fn from_entry(entry_price: f64, atr: f64, direction: f64, params: &LevelParams) -> Self {
        Self {
            stop: entry_price - direction * atr * params.sl_multiplier,
            target: entry_price + direction * atr * params.tp_multiplier,
            breakeven: params
                .be_multiplier
                .map(|be| entry_price + direction * atr * be),
        }
    }
}

/// Build the aligned exit-level column: `Some` at every signaled index,
/// `None` elsewhere.
///
/// Signals only fire where the ATR column is valid (warmup comparisons are
/// false), so every `Some` carries finite levels.
pub fn build_exit_levels(
    bars: &[Bar],
    signals: &[i8],
    atr: &[f64],
    params: &LevelParams,
) -> Vec<Option<ExitLevels>> {
    signals
        .iter()
        .enumerate()
        .map(|(i, &sig)| {
            if sig == 0 {
                None
            } else {
                Some(ExitLevels::from_entry(
                    bars[i].close,
                    atr[i],
                    sig as f64,
                    params,
                ))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    fn params() -> LevelParams {
        LevelParams {
            sl_multiplier: 1.5,
            tp_multiplier: 3.0,
            be_multiplier: Some(1.0),
        }
    }

    #[test]
    fn long_levels_bracket_entry() {
        let lv = ExitLevels::from_entry(100.0, 2.0, 1.0, &params());
        assert_eq!(lv.stop, 97.0);
        assert_eq!(lv.target, 106.0);
        assert_eq!(lv.breakeven, Some(102.0));
    }

    #[test]
    fn short_levels_mirror_long() {
        let lv = ExitLevels::from_entry(100.0, 2.0, -1.0, &params());
        assert_eq!(lv.stop, 103.0);
        assert_eq!(lv.target, 94.0);
        assert_eq!(lv.breakeven, Some(98.0));
    }

    #[test]
    fn breakeven_disabled_when_unset() {
        let p = LevelParams {
            be_multiplier: None,
            ..params()
        };
        let lv = ExitLevels::from_entry(100.0, 2.0, 1.0, &p);
        assert_eq!(lv.breakeven, None);
    }

    #[test]
    fn column_is_some_exactly_at_signals() {
        let bars = make_ohlc_bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
        ]);
        let signals = vec![0i8, 1, -1];
        let atr = vec![1.0, 1.0, 1.0];
        let levels = build_exit_levels(&bars, &signals, &atr, &params());
        assert!(levels[0].is_none());
        assert!(levels[1].is_some());
        assert!(levels[2].is_some());
        // Short entry at index 2: stop above, target below
        let short = levels[2].unwrap();
        assert!(short.stop > 100.0);
        assert!(short.target < 100.0);
    }
}
