//! Simulation errors.

use thiserror::Error;

/// Precondition violations surfaced by the exit simulator.
///
/// These are caller bugs, not market conditions: the simulator fails fast
/// rather than silently skipping malformed input. Degenerate statistics
/// (zero denominators etc.) are not errors and are handled by the metrics
/// layer with sentinel values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("bars ({bars}) and entry signals ({signals}) differ in length")]
    LengthMismatch { bars: usize, signals: usize },

    #[error("exit levels ({levels}) not aligned with bars ({bars})")]
    LevelsMismatch { bars: usize, levels: usize },

    #[error("entry signal at index {index} has no exit levels")]
    MissingExitLevels { index: usize },
}
