//! Bar — the fundamental market data unit.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument at a fixed timestamp.
///
/// The simulation treats `close` as the reference "price"; `high` and `low`
/// are used for intrabar stop/target crossing checks. Indicator series are
/// kept in separate aligned columns, never on the bar itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Basic OHLC sanity check: high is the bar maximum, low the minimum,
    /// and prices are positive.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Trading session this bar falls into, by hour of day.
    pub fn session(&self) -> Session {
        Session::from_hour(self.timestamp.hour())
    }
}

/// Intraday trading session, bucketed by hour of day (exchange-server time).
///
/// Entries are suppressed during `Deadzone` — the thin liquidity window
/// between the New York close and the Asia open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Session {
    Asia,
    London,
    NewYork,
    Deadzone,
}

impl Session {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            2..=9 => Session::Asia,
            10..=14 => Session::London,
            15..=23 => Session::NewYork,
            _ => Session::Deadzone,
        }
    }
}
