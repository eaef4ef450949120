//! Operator CLI: one idempotent subcommand per maintenance concern named
//! in the external interface list, plus the `backtest_engine` tuning tool
//! and a config introspection command. Every subcommand opens its own
//! connection and exits — there is no long-running state here, that's
//! `tc-daemon`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tc")]
#[command(about = "Operator commands for the trading engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cancel new/ack orders that have been hanging past a timeout.
    CancelStuckOrders {
        #[arg(long, default_value_t = 5)]
        minutes: i64,
    },

    /// Close out positions stuck at open with zero quantity.
    CleanupPositions,

    /// Diff stored positions against their own execution history.
    ReconcileTrades {
        /// Apply corrections; without this flag, drift is only reported.
        #[arg(long)]
        apply: bool,
    },

    /// Recompute realized PnL for recently closed positions and log it.
    RecomputePnlFromPositions {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Summarize trade_log activity over a lookback window.
    PerformanceReport {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Walk-forward replay of the strategy arbitrator over a CSV of bars.
    BacktestEngine {
        csv_path: String,
        #[arg(long, default_value = "")]
        symbol: String,
        #[arg(long, default_value = "")]
        timeframe: String,
        #[arg(long = "min-score")]
        min_score: Option<f64>,
        #[arg(long, default_value_t = 200)]
        warmup: usize,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the effective layered config after merge, plus its hash.
    ShowRuntimeConfig {
        /// Paths in merge order; defaults to TC_CONFIG_PATHS if omitted.
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::CancelStuckOrders { minutes } => {
            let pool = tc_db::connect_from_env().await?;
            let canceled = commands::cancel_stuck_orders(&pool, minutes).await?;
            println!("Canceled {canceled} stuck order(s).");
        }

        Commands::CleanupPositions => {
            let pool = tc_db::connect_from_env().await?;
            let count = commands::cleanup_positions(&pool).await?;
            println!("Processed {count} flat position(s).");
        }

        Commands::ReconcileTrades { apply } => {
            let pool = tc_db::connect_from_env().await?;
            let drift = commands::reconcile_trades(&pool, apply).await?;
            let prefix = if apply { "[APPLY]" } else { "[DRY-RUN]" };
            println!("{prefix} reconciled: {} drift(s) found", drift.len());
            for d in &drift {
                println!("  account={} symbol={} stored_qty={} implied_qty={}", d.broker_account_id, d.symbol, d.stored_qty, d.implied_qty);
            }
        }

        Commands::RecomputePnlFromPositions { days } => {
            let pool = tc_db::connect_from_env().await?;
            let outcome = commands::recompute_pnl_from_positions(&pool, days).await?;
            println!("Recomputed PnL for {} position(s) (skipped={})", outcome.recomputed, outcome.skipped_no_fills);
        }

        Commands::PerformanceReport { days } => {
            let pool = tc_db::connect_from_env().await?;
            let report = commands::performance_report(&pool, days).await?;
            println!("Performance last {days} day(s):");
            println!(" - total trade_log entries: {}", report.total);
            for (status, count) in &report.by_status {
                println!(" - {status}: {count}");
            }
            println!("\nBy bot:");
            for (bot_id, count) in &report.by_bot {
                println!("  {bot_id}: {count}");
            }
        }

        Commands::BacktestEngine { csv_path, symbol, timeframe, min_score, warmup, limit } => {
            let candles = tc_backtest::load_csv_file(&csv_path, limit)?;
            let min_score = min_score.unwrap_or_else(tc_backtest::default_min_score);
            let config = tc_backtest::BacktestConfig { symbol: symbol.clone(), timeframe: timeframe.clone(), min_score, warmup };
            let trades = tc_backtest::run_backtest(&candles, &config);
            let summary = tc_backtest::summarise(&trades);

            println!("Backtest complete on {} bars", candles.len());
            println!("symbol={} tf={} min_score={min_score}", if symbol.is_empty() { "-" } else { &symbol }, if timeframe.is_empty() { "-" } else { &timeframe });
            println!("trades={} wins={} losses={} flats={}", summary.trades, summary.wins, summary.losses, summary.flats);
            println!("win_rate={:.2}% avg_pnl={} total_pnl={}", summary.win_rate * 100.0, summary.avg_pnl, summary.total_pnl);

            for t in trades.iter().take(5) {
                println!(
                    "- {:?} entry={} {} exit={} {} pnl={} reason={} score={:.3}",
                    t.direction, t.entry_time, t.entry_price, t.exit_time, t.exit_price, t.pnl, t.reason, t.score
                );
            }
        }

        Commands::ShowRuntimeConfig { paths } => {
            let paths = if paths.is_empty() { config_paths_from_env() } else { paths };
            let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            let loaded = tc_config::load_layered_yaml(&path_refs)?;

            println!("config_hash: {}", loaded.config_hash);
            println!("{}", loaded.canonical_json);

            let defaults = tc_decision::DecisionRuntimeConfig::default();
            let overrides = loaded.config_json.get("risk").cloned().unwrap_or(serde_json::Value::Null);
            let effective = effective_decision_config(defaults, &overrides);
            println!("\nEffective decision runtime config:");
            println!("decision_min_score: {}", effective.decision_min_score);
            println!("decision_flip_score: {}", effective.decision_flip_score);
            println!("decision_flip_cooldown_min: {}", effective.decision_flip_cooldown_min);
            println!("decision_max_flips_per_day: {}", effective.decision_max_flips_per_day);
            println!("decision_scalp_sl_offset_pct: {}", effective.decision_scalp_sl_offset_pct);
            println!("decision_scalp_tp_offset_pct: {}", effective.decision_scalp_tp_offset_pct);
            println!("decision_scalp_qty_multiplier: {}", effective.decision_scalp_qty_multiplier);
        }
    }

    Ok(())
}

fn config_paths_from_env() -> Vec<String> {
    std::env::var("TC_CONFIG_PATHS")
        .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Overlays a `risk.*` config layer onto the compiled-in decision
/// defaults, the same pattern `tc-config`'s own tests exercise for
/// `risk.decision_min_score`.
fn effective_decision_config(mut cfg: tc_decision::DecisionRuntimeConfig, overrides: &serde_json::Value) -> tc_decision::DecisionRuntimeConfig {
    if let Some(v) = overrides.get("decision_min_score").and_then(|v| v.as_f64()) {
        cfg.decision_min_score = v;
    }
    if let Some(v) = overrides.get("decision_flip_score").and_then(|v| v.as_f64()) {
        cfg.decision_flip_score = v;
    }
    if let Some(v) = overrides.get("decision_flip_cooldown_min").and_then(|v| v.as_i64()) {
        cfg.decision_flip_cooldown_min = v;
    }
    if let Some(v) = overrides.get("decision_max_flips_per_day").and_then(|v| v.as_i64()) {
        cfg.decision_max_flips_per_day = v as i32;
    }
    if let Some(v) = overrides.get("decision_scalp_sl_offset_pct").and_then(|v| v.as_f64()) {
        cfg.decision_scalp_sl_offset_pct = v;
    }
    if let Some(v) = overrides.get("decision_scalp_tp_offset_pct").and_then(|v| v.as_f64()) {
        cfg.decision_scalp_tp_offset_pct = v;
    }
    if let Some(v) = overrides.get("decision_scalp_qty_multiplier").and_then(|v| v.as_f64()) {
        cfg.decision_scalp_qty_multiplier = v;
    }
    cfg
}
