//! ExitLab Runner — trial orchestration, metrics, and parallel grid search.
//!
//! This crate builds on `exitlab-core` to provide:
//! - Bar ingestion from CSV plus a seeded synthetic generator
//! - Strategy parameter sets with validation, hashing, and JSON persistence
//! - Parameter grids with index-decoded Cartesian enumeration
//! - Single-trial runner wiring indicators, signals, simulation, and equity
//! - Performance metrics report (trade stats, drawdowns, advanced ratios)
//! - Parallel grid optimization with progress reporting
//! - CSV export of results tables and trade tapes

pub mod data;
pub mod export;
pub mod metrics;
pub mod optimize;
pub mod params;
pub mod runner;

pub use data::{load_bars, synthetic_bars, LoadError};
pub use export::{export_results_csv, export_trades_csv, save_results_csv, save_trades_csv};
pub use metrics::{MetricsReport, RATIO_SENTINEL};
pub use optimize::{optimize, optimize_with_progress, OptimizationReport, ResultRow};
pub use params::{
    ParamError, ParamGrid, ParamSet, RunId, ATR_MEAN_PERIOD, BE_DISABLED_THRESHOLD,
};
pub use runner::{run_trial, run_trial_with_policy, TrialError, TrialResult};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn param_set_is_send_sync() {
        assert_send::<ParamSet>();
        assert_sync::<ParamSet>();
    }

    #[test]
    fn param_grid_is_send_sync() {
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
    }

    #[test]
    fn metrics_report_is_send_sync() {
        assert_send::<MetricsReport>();
        assert_sync::<MetricsReport>();
    }

    #[test]
    fn trial_result_is_send_sync() {
        assert_send::<TrialResult>();
        assert_sync::<TrialResult>();
    }

    #[test]
    fn optimization_report_is_send_sync() {
        assert_send::<OptimizationReport>();
        assert_sync::<OptimizationReport>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<ParamError>();
        assert_sync::<ParamError>();
        assert_send::<TrialError>();
        assert_sync::<TrialError>();
    }
}
