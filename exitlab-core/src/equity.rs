//! Bar-level cumulative-return equity curves.
//!
//! Two curves over the same timestamps: buy-and-hold (`market`) and the
//! strategy (`strategy`), both as cumulative-return multiples starting at 1.
//! The strategy curve applies the one-bar-lagged position state to log
//! returns, so a signal on bar `i` earns from bar `i+1` onward — no
//! lookahead.

use crate::domain::{Bar, Trade};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Cumulative-return curves aligned with the bar series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityCurve {
    pub timestamps: Vec<NaiveDateTime>,
    /// Buy-and-hold cumulative-return multiple (1.0 = flat).
    pub market: Vec<f64>,
    /// Strategy cumulative-return multiple (1.0 = flat).
    pub strategy: Vec<f64>,
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Final strategy multiple, 1.0 for an empty curve.
    pub fn final_strategy(&self) -> f64 {
        self.strategy.last().copied().unwrap_or(1.0)
    }

    /// Final buy-and-hold multiple, 1.0 for an empty curve.
    pub fn final_market(&self) -> f64 {
        self.market.last().copied().unwrap_or(1.0)
    }
}

/// Build both curves from the bar series and the resolved trade log.
///
/// Position state is reconstructed from the trades: +1/−1 from the entry bar
/// up to (but not including) the exit bar, 0 elsewhere. Overlapping trades
/// overwrite in entry order.
pub fn build_equity_curve(bars: &[Bar], trades: &[Trade]) -> EquityCurve {
    let n = bars.len();
    let mut state = vec![0.0f64; n];
    for trade in trades {
        let sign = trade.direction.sign();
        for s in state
            .iter_mut()
            .take(trade.exit_bar.min(n))
            .skip(trade.entry_bar)
        {
            *s = sign;
        }
    }

    let mut market = Vec::with_capacity(n);
    let mut strategy = Vec::with_capacity(n);
    let mut market_cum = 0.0;
    let mut strategy_cum = 0.0;

    for i in 0..n {
        if i > 0 {
            let r = (bars[i].close / bars[i - 1].close).ln();
            market_cum += r;
            strategy_cum += state[i - 1] * r;
        }
        market.push(market_cum.exp());
        strategy.push(strategy_cum.exp());
    }

    EquityCurve {
        timestamps: bars.iter().map(|b| b.timestamp).collect(),
        market,
        strategy,
    }
}
