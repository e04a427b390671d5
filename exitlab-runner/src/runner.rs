//! Single-trial runner — wires indicators, signals, levels, simulation, and
//! metrics into one stateless pass over a shared bar series.

use exitlab_core::{
    build_equity_curve, build_exit_levels, entry_signals, simulate, Bar, IndicatorSet,
    OverlapPolicy, SimError, Trade,
};
use thiserror::Error;

use crate::metrics::MetricsReport;
use crate::params::{ParamError, ParamSet, RunId};

/// Errors from a single trial. Inside the grid harness these drop the trial;
/// at the top level they surface to the caller.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error("parameter error: {0}")]
    Params(#[from] ParamError),
    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
}

/// Complete result of one simulation run.
#[derive(Debug, Clone)]
pub struct TrialResult {
    pub run_id: RunId,
    pub params: ParamSet,
    pub trades: Vec<Trade>,
    pub metrics: MetricsReport,
}

/// Run one backtest trial with the default overlap policy.
///
/// The bar series is read-only; every derived column (indicators, signals,
/// exit levels) is private to this trial, so concurrent trials never
/// interfere.
pub fn run_trial(
    bars: &[Bar],
    params: &ParamSet,
    position_size: f64,
) -> Result<TrialResult, TrialError> {
    run_trial_with_policy(bars, params, position_size, OverlapPolicy::default())
}

/// Run one backtest trial with an explicit overlap policy.
pub fn run_trial_with_policy(
    bars: &[Bar],
    params: &ParamSet,
    position_size: f64,
    policy: OverlapPolicy,
) -> Result<TrialResult, TrialError> {
    params.validate()?;

    let indicators = IndicatorSet::compute(bars, &params.indicator_spec());
    let signals = entry_signals(bars, &indicators, params.range_atr_filter);
    let levels = build_exit_levels(bars, &signals, &indicators.atr, &params.level_params());
    let trades = simulate(bars, &signals, &levels, position_size, policy)?;
    let curve = build_equity_curve(bars, &trades);
    let metrics = MetricsReport::compute(&trades, Some(&curve));

    Ok(TrialResult {
        run_id: params.run_id(),
        params: params.clone(),
        trades,
        metrics,
    })
}
