//! ExitLab CLI — grid optimization and single-run commands.
//!
//! Commands:
//! - `optimize` — sweep the parameter grid in parallel, print the leaderboard,
//!   save the champion parameter set as JSON
//! - `run` — execute one trial from a saved parameter JSON and print the
//!   full metrics report

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use exitlab_core::Bar;
use exitlab_runner::{
    load_bars, optimize_with_progress, run_trial, save_results_csv, save_trades_csv,
    synthetic_bars, OptimizationReport, ParamGrid, ParamSet, ResultRow,
};

#[derive(Parser)]
#[command(
    name = "exitlab",
    about = "ExitLab CLI — exit-level backtesting and parameter search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep the full parameter grid and report the best performers.
    Optimize {
        /// Path to an OHLCV CSV file (Datetime,Open,High,Low,Close,Volume).
        #[arg(long)]
        data: Option<PathBuf>,

        /// Generate this many synthetic hourly bars instead of loading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for the synthetic generator.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Position size in units of the traded instrument.
        #[arg(long, default_value_t = 100_000.0)]
        position_size: f64,

        /// Ignore parameter sets that produced fewer trades than this.
        #[arg(long, default_value_t = 30)]
        min_trades: usize,

        /// Leaderboard length.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Where to save the champion parameter set.
        #[arg(long, default_value = "best_params.json")]
        params_out: PathBuf,

        /// Optional CSV export of the full results table.
        #[arg(long)]
        results_out: Option<PathBuf>,
    },
    /// Run a single trial from a saved parameter JSON.
    Run {
        /// Path to an OHLCV CSV file (Datetime,Open,High,Low,Close,Volume).
        #[arg(long)]
        data: Option<PathBuf>,

        /// Generate this many synthetic hourly bars instead of loading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for the synthetic generator.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Parameter JSON produced by `optimize` (or hand-written).
        #[arg(long, default_value = "best_params.json")]
        params: PathBuf,

        /// Position size in units of the traded instrument.
        #[arg(long, default_value_t = 100_000.0)]
        position_size: f64,

        /// Optional CSV export of the trade tape.
        #[arg(long)]
        trades_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Optimize {
            data,
            synthetic,
            seed,
            position_size,
            min_trades,
            top,
            params_out,
            results_out,
        } => run_optimize(
            data,
            synthetic,
            seed,
            position_size,
            min_trades,
            top,
            &params_out,
            results_out.as_deref(),
        ),
        Commands::Run {
            data,
            synthetic,
            seed,
            params,
            position_size,
            trades_out,
        } => run_single(
            data,
            synthetic,
            seed,
            &params,
            position_size,
            trades_out.as_deref(),
        ),
    }
}

/// Resolve the bar series from the mutually exclusive data flags.
fn resolve_bars(data: Option<PathBuf>, synthetic: Option<usize>, seed: u64) -> Result<Vec<Bar>> {
    match (data, synthetic) {
        (Some(_), Some(_)) => bail!("--data and --synthetic are mutually exclusive"),
        (None, None) => bail!("one of --data or --synthetic is required"),
        (Some(path), None) => {
            let bars = load_bars(&path)
                .with_context(|| format!("failed to load bars from {}", path.display()))?;
            println!(
                "Loaded {} bars from {} ({} to {})",
                bars.len(),
                path.display(),
                bars.first().map(|b| b.timestamp.to_string()).unwrap_or_default(),
                bars.last().map(|b| b.timestamp.to_string()).unwrap_or_default(),
            );
            Ok(bars)
        }
        (None, Some(count)) => {
            if count == 0 {
                bail!("--synthetic requires a positive bar count");
            }
            println!("Generating {count} synthetic bars (seed {seed})");
            Ok(synthetic_bars(count, seed))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_optimize(
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    position_size: f64,
    min_trades: usize,
    top: usize,
    params_out: &Path,
    results_out: Option<&Path>,
) -> Result<()> {
    let bars = resolve_bars(data, synthetic, seed)?;
    let grid = ParamGrid::default_grid();
    println!("Grid size: {} combinations", grid.size());

    let report = optimize_with_progress(&bars, &grid, position_size, |done, total| {
        if done % 1000 == 0 || done == total {
            println!("  {done}/{total} trials");
        }
    });

    print_report_counts(&report);

    if report.is_empty() {
        bail!("no trial produced a result; check the input data");
    }

    let leaders = report.top_n(top, min_trades);
    if leaders.is_empty() {
        bail!("no parameter set produced at least {min_trades} trades");
    }
    print_leaderboard(&leaders, min_trades);

    let champion = leaders[0];
    println!();
    println!("=== Champion {} ===", short_id(&champion.run_id));
    print_params(&champion.params);
    println!("{}", champion.metrics);

    champion
        .params
        .save_json(params_out)
        .with_context(|| format!("failed to save {}", params_out.display()))?;
    println!("Champion parameters saved to {}", params_out.display());

    if let Some(path) = results_out {
        save_results_csv(report.rows(), path)?;
        println!(
            "Full results table ({} rows) saved to {}",
            report.rows().len(),
            path.display()
        );
    }

    Ok(())
}

fn run_single(
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    params_path: &Path,
    position_size: f64,
    trades_out: Option<&Path>,
) -> Result<()> {
    let bars = resolve_bars(data, synthetic, seed)?;
    let params = ParamSet::load_json(params_path)
        .with_context(|| format!("failed to load parameters from {}", params_path.display()))?;

    println!("Run {}", short_id(&params.run_id()));
    print_params(&params);

    let result = run_trial(&bars, &params, position_size)?;
    println!("{}", result.metrics);

    if let Some(path) = trades_out {
        save_trades_csv(&result.trades, path)?;
        println!("Trade tape ({} trades) saved to {}", result.trades.len(), path.display());
    }

    Ok(())
}

fn print_report_counts(report: &OptimizationReport) {
    println!();
    println!(
        "Trials: {} submitted, {} succeeded, {} failed",
        report.submitted(),
        report.succeeded(),
        report.failed()
    );
}

fn print_leaderboard(leaders: &[&ResultRow], min_trades: usize) {
    println!();
    println!("=== Top {} (min {} trades) ===", leaders.len(), min_trades);
    println!(
        "{:<10} {:>10} {:>7} {:>8} {:>7} {:>9} {:>7}",
        "Run", "Net", "Trades", "Win%", "PF", "MaxDD$", "SQN"
    );
    println!("{}", "-".repeat(64));
    for row in leaders {
        let m = &row.metrics;
        println!(
            "{:<10} {:>10.2} {:>7} {:>8.2} {:>7.2} {:>9.2} {:>7.2}",
            short_id(&row.run_id),
            m.net_profit,
            m.total_trades,
            m.win_rate_pct,
            m.profit_factor,
            m.max_drawdown_usd,
            m.sqn,
        );
    }
}

fn print_params(params: &ParamSet) {
    println!(
        "  SMA {}/{}/{}  BB {}x{:.1}  ATR {} (filter {:.1})  SL {:.1} TP {:.1} BE {:.1}",
        params.sma_fast,
        params.sma_slow,
        params.sma_trend,
        params.bb_period,
        params.bb_std,
        params.atr_period,
        params.range_atr_filter,
        params.sl_multiplier,
        params.tp_multiplier,
        params.be_multiplier,
    );
}

fn short_id(run_id: &str) -> &str {
    &run_id[..run_id.len().min(8)]
}
