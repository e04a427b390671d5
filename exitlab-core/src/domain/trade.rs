//! Trade — a completed round-trip produced by the exit simulator.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            TradeDirection::Long => 1.0,
            TradeDirection::Short => -1.0,
        }
    }
}

/// A complete round-trip trade: entry → exit at a stop or target level.
///
/// Only resolved trades exist — an entry whose scan reaches the end of the
/// bar series without crossing a level is dropped, never reported open.
/// Immutable once appended to the trade log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub direction: TradeDirection,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,

    // ── PnL ──
    /// Realized profit/loss in currency units:
    /// `(exit − entry) × direction sign × position size`.
    pub pnl: f64,
}

impl Trade {
    /// Holding duration. Strictly positive for any simulator-produced trade.
    pub fn duration(&self) -> Duration {
        self.exit_time - self.entry_time
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
