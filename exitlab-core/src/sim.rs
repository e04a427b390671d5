//! Exit simulator — deterministic per-entry scan for stop/target/breakeven.
//!
//! For each non-zero entry signal, the simulator scans forward through the
//! remaining bars until the stop-loss or take-profit level is crossed,
//! recording the exit at the level price. The scan is a pure function over
//! its inputs; the shared bar series is never mutated.
//!
//! Intrabar ambiguity policy: when a single bar crosses both the stop and
//! the target, the stop wins, because the stop is checked first. OHLC bars
//! do not reveal the intrabar path, so this is a fixed documented policy —
//! reorder the checks and every downstream number changes.

use crate::domain::{Bar, Trade, TradeDirection};
use crate::error::SimError;
use crate::levels::ExitLevels;

/// How to treat a new signal that fires while a previous simulated trade in
/// the same direction is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Every non-zero signal is an independent candidate trade.
    #[default]
    Independent,
    /// Skip signals until the prior same-direction trade has exited.
    SuppressWhileOpen,
}

/// Simulate trade exits over a bar series.
///
/// `signals` and `levels` must be aligned with `bars`; every signaled index
/// must carry `Some(ExitLevels)`. Violations fail fast with a [`SimError`].
///
/// Trades are returned in entry-index order. Entries whose scan reaches the
/// end of the series without crossing a level are dropped — there is no
/// notion of an open position in the output.
pub fn simulate(
    bars: &[Bar],
    signals: &[i8],
    levels: &[Option<ExitLevels>],
    position_size: f64,
    policy: OverlapPolicy,
) -> Result<Vec<Trade>, SimError> {
    if bars.len() != signals.len() {
        return Err(SimError::LengthMismatch {
            bars: bars.len(),
            signals: signals.len(),
        });
    }
    if bars.len() != levels.len() {
        return Err(SimError::LevelsMismatch {
            bars: bars.len(),
            levels: levels.len(),
        });
    }

    let mut trades = Vec::new();
    // Per-direction index of the bar where the last accepted trade exited;
    // usize::MAX marks a trade still open at the end of the data.
    let mut long_open_until: Option<usize> = None;
    let mut short_open_until: Option<usize> = None;

    for (i, &sig) in signals.iter().enumerate() {
        if sig == 0 {
            continue;
        }
        let lv = levels[i].ok_or(SimError::MissingExitLevels { index: i })?;

        // Last bar: no future bars to scan, entry can never resolve.
        if i + 1 >= bars.len() {
            continue;
        }

        let direction = if sig > 0 {
            TradeDirection::Long
        } else {
            TradeDirection::Short
        };

        if policy == OverlapPolicy::SuppressWhileOpen {
            let open_until = match direction {
                TradeDirection::Long => &mut long_open_until,
                TradeDirection::Short => &mut short_open_until,
            };
            if open_until.is_some_and(|until| i <= until) {
                continue;
            }
            match scan_exit(bars, i, direction, lv) {
                Some((exit_bar, exit_price)) => {
                    *open_until = Some(exit_bar);
                    trades.push(make_trade(
                        bars,
                        i,
                        exit_bar,
                        exit_price,
                        direction,
                        position_size,
                    ));
                }
                // Conceptually open until the data ends.
                None => *open_until = Some(usize::MAX),
            }
        } else if let Some((exit_bar, exit_price)) = scan_exit(bars, i, direction, lv) {
            trades.push(make_trade(
                bars,
                i,
                exit_bar,
                exit_price,
                direction,
                position_size,
            ));
        }
    }

    Ok(trades)
}

/// Scan bars after the entry for the first stop or target crossing.
///
/// Returns the exit bar index and the level price, or `None` if the series
/// ends first. The stop is evaluated before the target on every bar; the
/// breakeven trigger arms at most once, moving the stop to the entry price.
fn scan_exit(
    bars: &[Bar],
    entry_bar: usize,
    direction: TradeDirection,
    levels: ExitLevels,
) -> Option<(usize, f64)> {
    let entry_price = bars[entry_bar].close;
    let mut stop = levels.stop;
    let mut breakeven_armed = false;

    for (j, bar) in bars.iter().enumerate().skip(entry_bar + 1) {
        let (stop_hit, target_hit, trigger_hit) = match direction {
            TradeDirection::Long => (
                bar.low <= stop,
                bar.high >= levels.target,
                levels.breakeven.is_some_and(|be| bar.high >= be),
            ),
            TradeDirection::Short => (
                bar.high >= stop,
                bar.low <= levels.target,
                levels.breakeven.is_some_and(|be| bar.low <= be),
            ),
        };

        // Stop before target: the fixed same-bar tie-break.
        if stop_hit {
            return Some((j, stop));
        }
        if target_hit {
            return Some((j, levels.target));
        }
        if !breakeven_armed && trigger_hit {
            stop = entry_price;
            breakeven_armed = true;
        }
    }
    None
}

fn make_trade(
    bars: &[Bar],
    entry_bar: usize,
    exit_bar: usize,
    exit_price: f64,
    direction: TradeDirection,
    position_size: f64,
) -> Trade {
    let entry_price = bars[entry_bar].close;
    Trade {
        direction,
        entry_bar,
        entry_time: bars[entry_bar].timestamp,
        entry_price,
        exit_bar,
        exit_time: bars[exit_bar].timestamp,
        exit_price,
        pnl: (exit_price - entry_price) * direction.sign() * position_size,
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::domain::Bar;
    use proptest::prelude::*;

    /// Random-walk hourly bars from step fractions in [-0.02, 0.02].
    fn walk_bars(steps: &[f64]) -> Vec<Bar> {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut close = 100.0_f64;
        steps
            .iter()
            .enumerate()
            .map(|(i, &step)| {
                let open = close;
                close *= 1.0 + step;
                let high = open.max(close) * 1.003;
                let low = open.min(close) * 0.997;
                Bar {
                    timestamp: base + chrono::Duration::hours(i as i64),
                    open,
                    high,
                    low,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn simulator_invariants_hold(
            steps in prop::collection::vec(-0.02f64..0.02, 20..120),
            entry_every in 2usize..10,
            sl in 0.5f64..3.0,
            tp in 0.5f64..4.0,
            size in 1.0f64..100.0,
        ) {
            let bars = walk_bars(&steps);
            let n = bars.len();
            let mut signals = vec![0i8; n];
            let mut level_col = vec![None; n];
            let params = crate::levels::LevelParams {
                sl_multiplier: sl,
                tp_multiplier: tp,
                be_multiplier: None,
            };
            for i in (0..n).step_by(entry_every) {
                let dir = if i % (2 * entry_every) == 0 { 1i8 } else { -1 };
                signals[i] = dir;
                level_col[i] = Some(ExitLevels::from_entry(
                    bars[i].close,
                    bars[i].close * 0.005,
                    dir as f64,
                    &params,
                ));
            }

            let trades =
                simulate(&bars, &signals, &level_col, size, OverlapPolicy::Independent).unwrap();

            for t in &trades {
                // Strictly positive duration
                prop_assert!(t.exit_time > t.entry_time);
                // |pnl| = |exit − entry| × size
                let expected = (t.exit_price - t.entry_price).abs() * size;
                prop_assert!((t.pnl.abs() - expected).abs() < 1e-9);
                // PnL sign consistent with direction and price move
                let move_sign = (t.exit_price - t.entry_price) * t.direction.sign();
                prop_assert!(t.pnl == 0.0 || (t.pnl > 0.0) == (move_sign > 0.0));
            }

            // Entry-index order
            for w in trades.windows(2) {
                prop_assert!(w[0].entry_bar < w[1].entry_bar);
            }
        }

        #[test]
        fn suppress_is_subset_of_independent(
            steps in prop::collection::vec(-0.02f64..0.02, 20..80),
        ) {
            let bars = walk_bars(&steps);
            let n = bars.len();
            let mut signals = vec![0i8; n];
            let mut level_col = vec![None; n];
            let params = crate::levels::LevelParams {
                sl_multiplier: 1.0,
                tp_multiplier: 2.0,
                be_multiplier: None,
            };
            for i in (0..n).step_by(3) {
                signals[i] = 1;
                level_col[i] = Some(ExitLevels::from_entry(
                    bars[i].close,
                    bars[i].close * 0.004,
                    1.0,
                    &params,
                ));
            }

            let all =
                simulate(&bars, &signals, &level_col, 1.0, OverlapPolicy::Independent).unwrap();
            let suppressed = simulate(
                &bars,
                &signals,
                &level_col,
                1.0,
                OverlapPolicy::SuppressWhileOpen,
            )
            .unwrap();

            prop_assert!(suppressed.len() <= all.len());
            let all_entries: Vec<usize> = all.iter().map(|t| t.entry_bar).collect();
            for t in &suppressed {
                prop_assert!(all_entries.contains(&t.entry_bar));
            }
        }
    }
}
