//! Performance metrics — pure functions over the trade log and equity curve.
//!
//! Degenerate inputs are never errors here: an empty trade log yields the
//! zeroed sentinel record, and zero denominators resolve to defined sentinel
//! values so every column stays finite and totally ordered (sortable).
//! Raw values are kept unrounded; rounding to two decimals happens only at
//! presentation time.

use chrono::Datelike;
use exitlab_core::{EquityCurve, Trade};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for ratios whose denominator is exactly zero while the numerator
/// is positive. Large but finite, so result tables sort cleanly.
pub const RATIO_SENTINEL: f64 = 1_000.0;

/// Trading days per year, for annualizing Sharpe.
const TRADING_DAYS: f64 = 252.0;

/// Aggregate performance statistics for a single simulation run.
///
/// Curve-derived fields (`sharpe`, `calmar`, `recovery_factor`,
/// `max_drawdown_pct`, `total_return_pct`, `buy_hold_return_pct`) are zero
/// when no bar-level equity curve was supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    // ── Counts ──
    pub total_trades: usize,
    pub winners: usize,
    pub losers: usize,
    /// Winners / total × 100, in [0, 100].
    pub win_rate_pct: f64,

    // ── P&L aggregates ──
    pub gross_profit: f64,
    /// Absolute sum of losing pnl (≥ 0).
    pub gross_loss: f64,
    pub net_profit: f64,
    pub avg_win: f64,
    /// Mean of losing pnl (≤ 0).
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub risk_reward: f64,

    // ── Drawdown and streaks (trade-realized, by exit time) ──
    /// Dollar drawdown of the cumulative trade-pnl curve (≤ 0).
    pub max_drawdown_usd: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,

    // ── Duration ──
    /// Mean holding time, truncated to whole seconds.
    pub avg_trade_duration_secs: i64,

    // ── Risk-adjusted ratios ──
    pub sqn: f64,
    pub sharpe: f64,
    pub calmar: f64,
    pub recovery_factor: f64,

    // ── Bar-level curve statistics ──
    /// Percentage drawdown of the strategy cumulative-return curve (≤ 0).
    pub max_drawdown_pct: f64,
    pub total_return_pct: f64,
    pub buy_hold_return_pct: f64,
}

impl Default for MetricsReport {
    /// The zeroed sentinel record for an empty trade log.
    fn default() -> Self {
        Self {
            total_trades: 0,
            winners: 0,
            losers: 0,
            win_rate_pct: 0.0,
            gross_profit: 0.0,
            gross_loss: 0.0,
            net_profit: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            profit_factor: 0.0,
            expectancy: 0.0,
            risk_reward: 0.0,
            max_drawdown_usd: 0.0,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            avg_trade_duration_secs: 0,
            sqn: 0.0,
            sharpe: 0.0,
            calmar: 0.0,
            recovery_factor: 0.0,
            max_drawdown_pct: 0.0,
            total_return_pct: 0.0,
            buy_hold_return_pct: 0.0,
        }
    }
}

impl MetricsReport {
    /// Compute all statistics from a trade log and, when available, the
    /// bar-level cumulative-return equity curve.
    pub fn compute(trades: &[Trade], curve: Option<&EquityCurve>) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        // Trade-order statistics go by exit time.
        let mut by_exit: Vec<&Trade> = trades.iter().collect();
        by_exit.sort_by_key(|t| t.exit_time);

        let total_trades = trades.len();
        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        let winners = pnls.iter().filter(|&&p| p > 0.0).count();
        let losers = total_trades - winners;
        let win_rate_pct = winners as f64 / total_trades as f64 * 100.0;

        let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
        let gross_loss: f64 = pnls.iter().filter(|&&p| p <= 0.0).sum::<f64>().abs();
        let net_profit = gross_profit - gross_loss;

        let avg_win = if winners > 0 {
            gross_profit / winners as f64
        } else {
            0.0
        };
        let avg_loss = if losers > 0 {
            -(gross_loss / losers as f64)
        } else {
            0.0
        };

        let profit_factor = sentinel_ratio(gross_profit, gross_loss);
        let risk_reward = sentinel_ratio(avg_win.abs(), avg_loss.abs());

        let wr = win_rate_pct / 100.0;
        let expectancy = wr * avg_win - (1.0 - wr) * avg_loss.abs();

        let (max_consecutive_wins, max_consecutive_losses) = streaks(&by_exit);
        let max_drawdown_usd = realized_drawdown(&by_exit);

        let total_duration_secs: i64 = trades.iter().map(|t| t.duration().num_seconds()).sum();
        let avg_trade_duration_secs = total_duration_secs / total_trades as i64;

        let sqn = sqn(&pnls);

        let (sharpe, calmar, recovery_factor, max_drawdown_pct, total_return_pct, buy_hold) =
            match curve {
                Some(c) if !c.is_empty() => curve_stats(c),
                _ => (0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            };

        Self {
            total_trades,
            winners,
            losers,
            win_rate_pct,
            gross_profit,
            gross_loss,
            net_profit,
            avg_win,
            avg_loss,
            profit_factor,
            expectancy,
            risk_reward,
            max_drawdown_usd,
            max_consecutive_wins,
            max_consecutive_losses,
            avg_trade_duration_secs,
            sqn,
            sharpe,
            calmar,
            recovery_factor,
            max_drawdown_pct,
            total_return_pct,
            buy_hold_return_pct: buy_hold,
        }
    }
}

/// Numerator / denominator, with the sentinel for a zero denominator and a
/// positive numerator, and 0 when both sides are zero.
fn sentinel_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        if numerator > 0.0 {
            RATIO_SENTINEL
        } else {
            0.0
        }
    } else {
        numerator / denominator
    }
}

/// Longest winning and losing runs, run-length grouped over the win/loss
/// sequence in exit-time order.
fn streaks(by_exit: &[&Trade]) -> (usize, usize) {
    let mut max_wins = 0;
    let mut max_losses = 0;
    let mut wins = 0;
    let mut losses = 0;

    for trade in by_exit {
        if trade.is_winner() {
            wins += 1;
            losses = 0;
        } else {
            losses += 1;
            wins = 0;
        }
        max_wins = max_wins.max(wins);
        max_losses = max_losses.max(losses);
    }
    (max_wins, max_losses)
}

/// Max drawdown of the cumulative trade-pnl curve: min over time of
/// `equity − running max` (≤ 0).
fn realized_drawdown(by_exit: &[&Trade]) -> f64 {
    let mut equity = 0.0;
    let mut peak = 0.0f64;
    let mut max_dd = 0.0f64;

    for trade in by_exit {
        equity += trade.pnl;
        peak = peak.max(equity);
        max_dd = max_dd.min(equity - peak);
    }
    max_dd
}

/// System Quality Number: `sqrt(N) × mean(pnl) / std(pnl)`, 0 if std is 0.
fn sqn(pnls: &[f64]) -> f64 {
    let std = std_dev(pnls);
    if std < 1e-12 {
        return 0.0;
    }
    (pnls.len() as f64).sqrt() * mean(pnls) / std
}

/// Sharpe, Calmar, recovery factor, drawdown %, total return %, buy-and-hold %
/// from the bar-level cumulative-return curves.
fn curve_stats(curve: &EquityCurve) -> (f64, f64, f64, f64, f64, f64) {
    let max_drawdown_pct = percentage_drawdown(&curve.strategy);
    let total_return_pct = (curve.final_strategy() - 1.0) * 100.0;
    let buy_hold_pct = (curve.final_market() - 1.0) * 100.0;

    let sharpe = sharpe_ratio(curve);
    let calmar = calmar_ratio(curve, max_drawdown_pct);
    let recovery_factor = if max_drawdown_pct == 0.0 {
        if total_return_pct > 0.0 {
            RATIO_SENTINEL
        } else {
            0.0
        }
    } else {
        total_return_pct / max_drawdown_pct.abs()
    };

    (
        sharpe,
        calmar,
        recovery_factor,
        max_drawdown_pct,
        total_return_pct,
        buy_hold_pct,
    )
}

/// Percentage drawdown of a cumulative-return series:
/// `min((v − running max) / running max) × 100` (≤ 0).
fn percentage_drawdown(series: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0f64;

    for &v in series {
        peak = peak.max(v);
        if peak > 0.0 {
            max_dd = max_dd.min((v - peak) / peak);
        }
    }
    max_dd * 100.0
}

/// Annualized Sharpe from daily-resampled strategy returns.
///
/// Last curve value per calendar date, percentage change day over day,
/// `mean / std × sqrt(252)`. 0 when fewer than two daily points or the
/// deviation is zero — a soft failure, never an error.
fn sharpe_ratio(curve: &EquityCurve) -> f64 {
    let daily = daily_closes(curve);
    if daily.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = daily
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    let std = std_dev(&returns);
    if std < 1e-12 {
        return 0.0;
    }
    mean(&returns) / std * TRADING_DAYS.sqrt()
}

/// Calmar: CAGR over the elapsed span divided by |max drawdown fraction|.
/// 0 when the span or the drawdown is zero (soft failure).
fn calmar_ratio(curve: &EquityCurve, max_drawdown_pct: f64) -> f64 {
    if curve.len() < 2 || max_drawdown_pct == 0.0 {
        return 0.0;
    }
    let first = curve.timestamps[0];
    let last = curve.timestamps[curve.len() - 1];
    let years = (last - first).num_days() as f64 / 365.25;
    let final_multiple = curve.final_strategy();
    if years <= 0.0 || final_multiple <= 0.0 {
        return 0.0;
    }
    let cagr = final_multiple.powf(1.0 / years) - 1.0;
    cagr / (max_drawdown_pct / 100.0).abs()
}

/// Last strategy value per calendar date, in date order.
fn daily_closes(curve: &EquityCurve) -> Vec<f64> {
    let mut daily = Vec::new();
    let mut current_day: Option<(i32, u32)> = None;

    for (ts, &v) in curve.timestamps.iter().zip(&curve.strategy) {
        let day = (ts.year(), ts.ordinal());
        if current_day == Some(day) {
            *daily.last_mut().expect("day marker without value") = v;
        } else {
            daily.push(v);
            current_day = Some(day);
        }
    }
    daily
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n−1 denominator), 0 for fewer than 2 values.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Round to 2 decimal places for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole-second duration as `[Nd ]HH:MM:SS`.
pub fn format_duration(total_secs: i64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let mins = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{mins:02}:{secs:02}")
    } else {
        format!("{hours:02}:{mins:02}:{secs:02}")
    }
}

impl fmt::Display for MetricsReport {
    /// The human-readable performance report, rounded to 2 decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== Performance Report ====")?;
        writeln!(f, "{:<22}: {}", "Total Trades", self.total_trades)?;
        writeln!(f, "{:<22}: {}", "Win Rate (%)", round2(self.win_rate_pct))?;
        writeln!(f, "{:<22}: {}", "Net Profit ($)", round2(self.net_profit))?;
        writeln!(f, "{:<22}: {}", "Avg Win ($)", round2(self.avg_win))?;
        writeln!(f, "{:<22}: {}", "Avg Loss ($)", round2(self.avg_loss))?;
        writeln!(f, "{:<22}: {}", "Profit Factor", round2(self.profit_factor))?;
        writeln!(f, "{:<22}: {}", "Expectancy ($)", round2(self.expectancy))?;
        writeln!(f, "{:<22}: {}", "Risk/Reward", round2(self.risk_reward))?;
        writeln!(
            f,
            "{:<22}: {}",
            "Max Drawdown ($)",
            round2(self.max_drawdown_usd)
        )?;
        writeln!(
            f,
            "{:<22}: {}",
            "Max Drawdown (%)",
            round2(self.max_drawdown_pct)
        )?;
        writeln!(
            f,
            "{:<22}: {}",
            "Max Consec. Losses", self.max_consecutive_losses
        )?;
        writeln!(f, "{:<22}: {}", "SQN Score", round2(self.sqn))?;
        writeln!(f, "{:<22}: {}", "Sharpe Ratio", round2(self.sharpe))?;
        writeln!(f, "{:<22}: {}", "Calmar Ratio", round2(self.calmar))?;
        writeln!(
            f,
            "{:<22}: {}",
            "Recovery Factor",
            round2(self.recovery_factor)
        )?;
        writeln!(
            f,
            "{:<22}: {}",
            "Avg Duration",
            format_duration(self.avg_trade_duration_secs)
        )?;
        writeln!(
            f,
            "{:<22}: {}",
            "Total Return (%)",
            round2(self.total_return_pct)
        )?;
        write!(
            f,
            "{:<22}: {}",
            "Buy & Hold (%)",
            round2(self.buy_hold_return_pct)
        )
    }
}
