//! Domain types for exitlab.

pub mod bar;
pub mod trade;

pub use bar::{Bar, Session};
pub use trade::{Trade, TradeDirection};
