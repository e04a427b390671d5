//! Result export — CSV artifacts for external analysis tools.
//!
//! Two tables are exported: the optimization results table (one row per
//! surviving trial, parameters plus headline metrics) and the trade tape
//! of a single run. Monetary and ratio columns are rounded to two
//! decimals at write time; in-memory values stay full precision.

use std::path::Path;

use anyhow::{Context, Result};
use exitlab_core::Trade;

use crate::metrics::round2;
use crate::optimize::ResultRow;

/// Export the optimization results table as CSV.
///
/// Columns: run_id, the ten strategy parameters, then headline metrics.
pub fn export_results_csv(rows: &[ResultRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "run_id",
        "sma_fast",
        "sma_slow",
        "sma_trend",
        "bb_period",
        "bb_std",
        "atr_period",
        "range_atr_filter",
        "sl_multiplier",
        "tp_multiplier",
        "be_multiplier",
        "total_trades",
        "win_rate_pct",
        "net_profit",
        "profit_factor",
        "expectancy",
        "max_drawdown_usd",
        "max_drawdown_pct",
        "sqn",
        "sharpe",
        "calmar",
        "recovery_factor",
        "total_return_pct",
        "buy_hold_return_pct",
    ])?;

    for row in rows {
        let p = &row.params;
        let m = &row.metrics;
        wtr.write_record([
            row.run_id.as_str(),
            &p.sma_fast.to_string(),
            &p.sma_slow.to_string(),
            &p.sma_trend.to_string(),
            &p.bb_period.to_string(),
            &p.bb_std.to_string(),
            &p.atr_period.to_string(),
            &p.range_atr_filter.to_string(),
            &p.sl_multiplier.to_string(),
            &p.tp_multiplier.to_string(),
            &p.be_multiplier.to_string(),
            &m.total_trades.to_string(),
            &format!("{:.2}", round2(m.win_rate_pct)),
            &format!("{:.2}", round2(m.net_profit)),
            &format!("{:.2}", round2(m.profit_factor)),
            &format!("{:.2}", round2(m.expectancy)),
            &format!("{:.2}", round2(m.max_drawdown_usd)),
            &format!("{:.2}", round2(m.max_drawdown_pct)),
            &format!("{:.2}", round2(m.sqn)),
            &format!("{:.2}", round2(m.sharpe)),
            &format!("{:.2}", round2(m.calmar)),
            &format!("{:.2}", round2(m.recovery_factor)),
            &format!("{:.2}", round2(m.total_return_pct)),
            &format!("{:.2}", round2(m.buy_hold_return_pct)),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write the results table to a file.
pub fn save_results_csv(rows: &[ResultRow], path: &Path) -> Result<()> {
    let csv = export_results_csv(rows)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Export a trade tape as CSV.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "direction",
        "entry_bar",
        "entry_time",
        "entry_price",
        "exit_bar",
        "exit_time",
        "exit_price",
        "pnl",
    ])?;

    for t in trades {
        wtr.write_record([
            &format!("{:?}", t.direction),
            &t.entry_bar.to_string(),
            &t.entry_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_bar.to_string(),
            &t.exit_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.2}", t.pnl),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write a trade tape to a file.
pub fn save_trades_csv(trades: &[Trade], path: &Path) -> Result<()> {
    let csv = export_trades_csv(trades)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use exitlab_core::TradeDirection;

    use crate::metrics::MetricsReport;
    use crate::params::ParamSet;

    fn sample_row() -> ResultRow {
        let params = ParamSet {
            sma_fast: 20,
            sma_slow: 50,
            sma_trend: 150,
            bb_period: 20,
            bb_std: 2.0,
            atr_period: 14,
            range_atr_filter: 1.2,
            sl_multiplier: 1.5,
            tp_multiplier: 3.0,
            be_multiplier: 1.0,
        };
        let metrics = MetricsReport {
            total_trades: 42,
            net_profit: 1234.567,
            win_rate_pct: 55.5555,
            ..Default::default()
        };
        ResultRow {
            run_id: params.run_id(),
            params,
            metrics,
        }
    }

    fn sample_trade() -> Trade {
        let entry = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let exit = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        Trade {
            direction: TradeDirection::Long,
            entry_bar: 7,
            entry_time: entry,
            entry_price: 1.0850,
            exit_bar: 11,
            exit_time: exit,
            exit_price: 1.0910,
            pnl: 600.0,
        }
    }

    #[test]
    fn results_csv_has_all_columns() {
        let rows = vec![sample_row()];
        let csv = export_results_csv(&rows).unwrap();
        let header = csv.lines().next().unwrap();
        let cols: Vec<&str> = header.split(',').collect();

        assert_eq!(cols.len(), 24);
        assert!(cols.contains(&"run_id"));
        assert!(cols.contains(&"sma_fast"));
        assert!(cols.contains(&"be_multiplier"));
        assert!(cols.contains(&"net_profit"));
        assert!(cols.contains(&"sqn"));
        assert!(cols.contains(&"buy_hold_return_pct"));
    }

    #[test]
    fn results_csv_rounds_to_two_decimals() {
        let rows = vec![sample_row()];
        let csv = export_results_csv(&rows).unwrap();
        let data = csv.lines().nth(1).unwrap();
        assert!(data.contains("1234.57"));
        assert!(data.contains("55.56"));
    }

    #[test]
    fn results_csv_empty_is_header_only() {
        let csv = export_results_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn trades_csv_content() {
        let csv = export_trades_csv(&[sample_trade()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "direction,entry_bar,entry_time,entry_price,exit_bar,exit_time,exit_price,pnl"
        );
        assert!(lines[1].starts_with("Long,7,2024-03-15 10:00:00,1.085000"));
        assert!(lines[1].ends_with("600.00"));
    }

    #[test]
    fn save_results_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        save_results_csv(&[sample_row()], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("run_id,"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn save_trades_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        save_trades_csv(&[sample_trade()], &path).unwrap();
        assert!(path.exists());
    }
}
