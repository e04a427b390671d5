//! Parallel grid search over the parameter space.
//!
//! Every combination is an independent, stateless trial: the shared bar
//! series is read-only, all derived state is trial-private, and results are
//! collected in whatever order the workers finish. A failing trial is
//! dropped from the table — the run keeps going and the report carries the
//! submitted/succeeded counts.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use exitlab_core::Bar;

use crate::metrics::MetricsReport;
use crate::params::{ParamGrid, ParamSet, RunId};
use crate::runner::run_trial;

/// One successful trial: the parameters and the statistics they produced.
/// Trade logs are not retained — with grids in the hundreds of thousands
/// that would dominate memory for no ranking benefit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub run_id: RunId,
    pub params: ParamSet,
    pub metrics: MetricsReport,
}

/// Aggregated results of a grid search.
///
/// The table is unordered; callers filter and sort. A grid where every
/// trial failed is an empty table plus the counts, not an error.
#[derive(Debug, Clone)]
pub struct OptimizationReport {
    rows: Vec<ResultRow>,
    submitted: usize,
}

impl OptimizationReport {
    /// Number of trials submitted (the full Cartesian product).
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Number of trials that produced a result row.
    pub fn succeeded(&self) -> usize {
        self.rows.len()
    }

    /// Number of trials dropped due to errors.
    pub fn failed(&self) -> usize {
        self.submitted - self.rows.len()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with at least `min_trades` trades.
    pub fn with_min_trades(&self, min_trades: usize) -> Vec<&ResultRow> {
        self.rows
            .iter()
            .filter(|r| r.metrics.total_trades >= min_trades)
            .collect()
    }

    /// All rows, best net profit first.
    pub fn sorted_by_net_profit(&self) -> Vec<&ResultRow> {
        let mut sorted: Vec<_> = self.rows.iter().collect();
        sorted.sort_by(|a, b| {
            b.metrics
                .net_profit
                .partial_cmp(&a.metrics.net_profit)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    /// Top `n` rows by net profit among those with at least `min_trades`.
    pub fn top_n(&self, n: usize, min_trades: usize) -> Vec<&ResultRow> {
        let mut rows = self.with_min_trades(min_trades);
        rows.sort_by(|a, b| {
            b.metrics
                .net_profit
                .partial_cmp(&a.metrics.net_profit)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows.truncate(n);
        rows
    }

    /// Best row by net profit among those with at least `min_trades`.
    pub fn best(&self, min_trades: usize) -> Option<&ResultRow> {
        self.top_n(1, min_trades).into_iter().next()
    }
}

/// Run every combination in the grid against the shared bar series.
///
/// Combinations are decoded by index inside the workers, so neither the
/// parameter sets nor the trial inputs are materialized up front.
pub fn optimize(bars: &[Bar], grid: &ParamGrid, position_size: f64) -> OptimizationReport {
    let submitted = grid.size();
    let rows: Vec<ResultRow> = (0..submitted)
        .into_par_iter()
        .filter_map(|i| {
            let params = grid.combination(i);
            run_trial(bars, &params, position_size)
                .ok()
                .map(|trial| ResultRow {
                    run_id: trial.run_id,
                    params: trial.params,
                    metrics: trial.metrics,
                })
        })
        .collect();

    OptimizationReport { rows, submitted }
}

/// Like [`optimize`], invoking `progress(done, total)` as trials complete.
///
/// Completion order is arbitrary; `done` is the count of finished trials,
/// not an index.
pub fn optimize_with_progress<F>(
    bars: &[Bar],
    grid: &ParamGrid,
    position_size: f64,
    progress: F,
) -> OptimizationReport
where
    F: Fn(usize, usize) + Send + Sync,
{
    let submitted = grid.size();
    let done = AtomicUsize::new(0);

    let rows: Vec<ResultRow> = (0..submitted)
        .into_par_iter()
        .filter_map(|i| {
            let params = grid.combination(i);
            let result = run_trial(bars, &params, position_size)
                .ok()
                .map(|trial| ResultRow {
                    run_id: trial.run_id,
                    params: trial.params,
                    metrics: trial.metrics,
                });
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress(finished, submitted);
            result
        })
        .collect();

    OptimizationReport { rows, submitted }
}
