//! Strategy parameters: single sets, persisted champions, and search grids.
//!
//! A `ParamSet` is a flat key→number mapping, so the winning set serializes
//! to plain JSON that a live-execution collaborator can reload verbatim.

use exitlab_core::{IndicatorSpec, LevelParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Window for the rolling mean of ATR used by the volatility filter.
/// Fixed rather than searched — widening the grid here buys nothing.
pub const ATR_MEAN_PERIOD: usize = 50;

/// Breakeven multipliers at or above this value never trigger in practice
/// and are treated as "breakeven disabled".
pub const BE_DISABLED_THRESHOLD: f64 = 100.0;

/// Unique identifier for a parameter set (content-addressable hash).
pub type RunId = String;

/// Parameter validation and persistence errors.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("moving averages must be ordered fast < slow < trend, got {fast}/{slow}/{trend}")]
    MaOrdering {
        fast: usize,
        slow: usize,
        trend: usize,
    },
    #[error("{name} must be non-zero")]
    ZeroPeriod { name: &'static str },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One complete strategy/risk parameter set. Immutable once constructed;
/// one instance drives exactly one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub sma_trend: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub atr_period: usize,
    pub range_atr_filter: f64,
    pub sl_multiplier: f64,
    pub tp_multiplier: f64,
    pub be_multiplier: f64,
}

impl ParamSet {
    /// Reject degenerate combinations before they reach the simulator.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.sma_fast >= self.sma_slow || self.sma_slow >= self.sma_trend {
            return Err(ParamError::MaOrdering {
                fast: self.sma_fast,
                slow: self.sma_slow,
                trend: self.sma_trend,
            });
        }
        if self.bb_period == 0 {
            return Err(ParamError::ZeroPeriod { name: "bb_period" });
        }
        if self.atr_period == 0 {
            return Err(ParamError::ZeroPeriod { name: "atr_period" });
        }
        for (name, value) in [
            ("bb_std", self.bb_std),
            ("range_atr_filter", self.range_atr_filter),
            ("sl_multiplier", self.sl_multiplier),
            ("tp_multiplier", self.tp_multiplier),
            ("be_multiplier", self.be_multiplier),
        ] {
            if value <= 0.0 {
                return Err(ParamError::NonPositive { name, value });
            }
        }
        Ok(())
    }

    /// Deterministic hash ID for this parameter set.
    ///
    /// Two identical sets share an ID, so replaying a persisted champion
    /// can be verified against the optimization row that produced it.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("ParamSet serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Indicator windows for this set.
    pub fn indicator_spec(&self) -> IndicatorSpec {
        IndicatorSpec {
            sma_fast: self.sma_fast,
            sma_slow: self.sma_slow,
            sma_trend: self.sma_trend,
            bb_period: self.bb_period,
            bb_std: self.bb_std,
            atr_period: self.atr_period,
            atr_mean_period: ATR_MEAN_PERIOD,
        }
    }

    /// Exit-level multipliers for this set.
    pub fn level_params(&self) -> LevelParams {
        LevelParams {
            sl_multiplier: self.sl_multiplier,
            tp_multiplier: self.tp_multiplier,
            be_multiplier: if self.be_multiplier >= BE_DISABLED_THRESHOLD {
                None
            } else {
                Some(self.be_multiplier)
            },
        }
    }

    /// Persist as a flat JSON object.
    pub fn save_json(&self, path: &Path) -> Result<(), ParamError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reload a persisted parameter set.
    pub fn load_json(path: &Path) -> Result<Self, ParamError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Cartesian search grid: one non-empty candidate list per parameter.
///
/// Combinations are decoded on demand by index (mixed radix), so the full
/// product — easily hundreds of thousands of sets — is never materialized.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub sma_fast: Vec<usize>,
    pub sma_slow: Vec<usize>,
    pub sma_trend: Vec<usize>,
    pub bb_period: Vec<usize>,
    pub bb_std: Vec<f64>,
    pub atr_period: Vec<usize>,
    pub range_atr_filter: Vec<f64>,
    pub sl_multiplier: Vec<f64>,
    pub tp_multiplier: Vec<f64>,
    pub be_multiplier: Vec<f64>,
}

impl ParamGrid {
    /// The full search space used by the auto-pilot optimizer.
    pub fn default_grid() -> Self {
        Self {
            sma_fast: (5..50).step_by(5).collect(),
            sma_slow: (50..160).step_by(10).collect(),
            sma_trend: vec![200],
            bb_period: vec![20],
            bb_std: float_range(2.0, 2.6, 0.1),
            atr_period: vec![14],
            range_atr_filter: vec![0.8],
            sl_multiplier: float_range(1.5, 3.1, 0.1),
            tp_multiplier: float_range(2.0, 6.5, 0.5),
            be_multiplier: vec![1.5, BE_DISABLED_THRESHOLD],
        }
    }

    /// Total number of combinations (product of list lengths).
    pub fn size(&self) -> usize {
        self.sma_fast.len()
            * self.sma_slow.len()
            * self.sma_trend.len()
            * self.bb_period.len()
            * self.bb_std.len()
            * self.atr_period.len()
            * self.range_atr_filter.len()
            * self.sl_multiplier.len()
            * self.tp_multiplier.len()
            * self.be_multiplier.len()
    }

    /// Decode combination `index` (0-based, `< size()`), first list varying
    /// fastest. Panics on an out-of-range index or an empty list.
    pub fn combination(&self, index: usize) -> ParamSet {
        assert!(index < self.size(), "combination index out of range");
        let mut idx = index;
        ParamSet {
            sma_fast: pick(&self.sma_fast, &mut idx),
            sma_slow: pick(&self.sma_slow, &mut idx),
            sma_trend: pick(&self.sma_trend, &mut idx),
            bb_period: pick(&self.bb_period, &mut idx),
            bb_std: pick(&self.bb_std, &mut idx),
            atr_period: pick(&self.atr_period, &mut idx),
            range_atr_filter: pick(&self.range_atr_filter, &mut idx),
            sl_multiplier: pick(&self.sl_multiplier, &mut idx),
            tp_multiplier: pick(&self.tp_multiplier, &mut idx),
            be_multiplier: pick(&self.be_multiplier, &mut idx),
        }
    }
}

/// One mixed-radix digit: select from `values`, advance the running index.
fn pick<T: Copy>(values: &[T], idx: &mut usize) -> T {
    let v = values[*idx % values.len()];
    *idx /= values.len();
    v
}

/// Half-open float range with 1-decimal rounding, matching the grid spec.
fn float_range(start: f64, end: f64, step: f64) -> Vec<f64> {
    let mut out = Vec::new();
    let mut v = start;
    while v < end - 1e-9 {
        out.push((v * 10.0).round() / 10.0);
        v += step;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_params() -> ParamSet {
        ParamSet {
            sma_fast: 20,
            sma_slow: 100,
            sma_trend: 200,
            bb_period: 20,
            bb_std: 2.0,
            atr_period: 14,
            range_atr_filter: 0.8,
            sl_multiplier: 1.5,
            tp_multiplier: 3.0,
            be_multiplier: 1.5,
        }
    }

    #[test]
    fn validate_accepts_sane_params() {
        assert!(sample_params().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unordered_mas() {
        let mut p = sample_params();
        p.sma_fast = 100;
        assert!(matches!(
            p.validate(),
            Err(ParamError::MaOrdering { .. })
        ));
    }

    #[test]
    fn validate_rejects_non_positive_multiplier() {
        let mut p = sample_params();
        p.sl_multiplier = 0.0;
        assert!(matches!(
            p.validate(),
            Err(ParamError::NonPositive { name: "sl_multiplier", .. })
        ));
    }

    #[test]
    fn run_id_is_deterministic_and_param_sensitive() {
        let p = sample_params();
        assert_eq!(p.run_id(), p.run_id());
        let mut q = p.clone();
        q.tp_multiplier = 3.5;
        assert_ne!(p.run_id(), q.run_id());
    }

    #[test]
    fn level_params_disable_breakeven_at_threshold() {
        let mut p = sample_params();
        assert_eq!(p.level_params().be_multiplier, Some(1.5));
        p.be_multiplier = BE_DISABLED_THRESHOLD;
        assert_eq!(p.level_params().be_multiplier, None);
    }

    #[test]
    fn json_roundtrip_is_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best_params.json");
        let p = sample_params();
        p.save_json(&path).unwrap();
        let reloaded = ParamSet::load_json(&path).unwrap();
        assert_eq!(p, reloaded);
        assert_eq!(p.run_id(), reloaded.run_id());
    }

    #[test]
    fn json_is_a_flat_object_of_numbers() {
        let json = serde_json::to_value(sample_params()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 10);
        assert!(obj.values().all(|v| v.is_number()));
    }

    #[test]
    fn grid_size_is_product_of_lengths() {
        let grid = ParamGrid {
            sma_fast: vec![10, 20, 30],
            sma_slow: vec![50, 100],
            sma_trend: vec![200],
            bb_period: vec![20],
            bb_std: vec![2.0],
            atr_period: vec![14],
            range_atr_filter: vec![0.8],
            sl_multiplier: vec![1.5, 2.0],
            tp_multiplier: vec![3.0, 4.0],
            be_multiplier: vec![1.5],
        };
        assert_eq!(grid.size(), 3 * 2 * 2 * 2);
    }

    #[test]
    fn combinations_enumerate_every_set_exactly_once() {
        let grid = ParamGrid {
            sma_fast: vec![10, 20],
            sma_slow: vec![50, 100],
            sma_trend: vec![200],
            bb_period: vec![20],
            bb_std: vec![2.0, 2.5],
            atr_period: vec![14],
            range_atr_filter: vec![0.8],
            sl_multiplier: vec![1.5],
            tp_multiplier: vec![3.0],
            be_multiplier: vec![1.5],
        };
        let mut seen = std::collections::HashSet::new();
        for i in 0..grid.size() {
            seen.insert(grid.combination(i).run_id());
        }
        assert_eq!(seen.len(), grid.size());
    }

    #[test]
    fn default_grid_matches_documented_space() {
        let grid = ParamGrid::default_grid();
        assert_eq!(grid.sma_fast, vec![5, 10, 15, 20, 25, 30, 35, 40, 45]);
        assert_eq!(
            grid.sma_slow,
            vec![50, 60, 70, 80, 90, 100, 110, 120, 130, 140, 150]
        );
        assert_eq!(grid.bb_std, vec![2.0, 2.1, 2.2, 2.3, 2.4, 2.5]);
        assert_eq!(grid.sl_multiplier.len(), 16);
        assert_eq!(grid.tp_multiplier, vec![2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0]);
        assert_eq!(grid.be_multiplier, vec![1.5, 100.0]);
    }

    #[test]
    fn float_range_endpoint_exclusive() {
        assert_eq!(float_range(1.5, 3.1, 0.1).last().copied(), Some(3.0));
        assert_eq!(float_range(2.0, 6.5, 0.5).last().copied(), Some(6.0));
    }
}
