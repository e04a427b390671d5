//! exitlab core — domain types, indicators, signals, exit simulation, equity curves.
//!
//! This crate contains the deterministic heart of the system:
//! - Domain types (bars, sessions, trades)
//! - Indicator columns (SMA, Bollinger bands, ATR) with NaN warmup
//! - Entry-signal generation (trend + band trigger + volatility regime)
//! - Exit-level derivation from ATR multipliers
//! - The per-entry exit scan (stop before target, one-shot breakeven)
//! - Bar-level cumulative-return equity curves
//!
//! Everything here is a pure function over read-only inputs; the grid-search
//! harness in `exitlab-runner` shares one bar series across all workers and
//! gives each trial its own derived columns.

pub mod domain;
pub mod equity;
pub mod error;
pub mod indicators;
pub mod levels;
pub mod signals;
pub mod sim;

pub use domain::{Bar, Session, Trade, TradeDirection};
pub use equity::{build_equity_curve, EquityCurve};
pub use error::SimError;
pub use indicators::{IndicatorSet, IndicatorSpec};
pub use levels::{build_exit_levels, ExitLevels, LevelParams};
pub use signals::entry_signals;
pub use sim::{simulate, OverlapPolicy};
