//! Operator command bodies. Thin wrappers over `tc-db`/`tc-monitor`/
//! `tc-portfolio`/`tc-backtest` — `main.rs` only does arg parsing and
//! printing.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;
use tc_primitives::Decimal8;
use tc_schemas::{OrderSide, TradeLogStatus};
use uuid::Uuid;

pub async fn cancel_stuck_orders(pool: &PgPool, minutes: i64) -> Result<usize> {
    let now = Utc::now();
    let cutoff = now - chrono::Duration::minutes(minutes);
    let candidates = tc_db::list_stale_open_orders(pool, cutoff).await?;

    let mut canceled = 0usize;
    for mut order in candidates {
        if tc_monitor::cancel_if_stale(&mut order, now, minutes * 60) {
            tc_db::transition_order_status(pool, order.id, order.status, order.last_error.as_deref(), now).await?;
            canceled += 1;
        }
    }
    Ok(canceled)
}

pub async fn cleanup_positions(pool: &PgPool) -> Result<usize> {
    let flat = tc_db::list_flat_open_positions(pool).await?;
    let count = flat.len();
    for mut position in flat {
        position.close();
        tc_db::save_position(pool, &position).await?;
    }
    Ok(count)
}

#[derive(Debug)]
pub struct ReconcileDrift {
    pub broker_account_id: Uuid,
    pub symbol: String,
    pub stored_qty: Decimal8,
    pub implied_qty: Decimal8,
}

/// Checks every open position against the fills that actually produced
/// it. There is no live MT5 snapshot source wired into this workspace's
/// broker adapter contract (`BrokerConnector` only places/cancels orders
/// and checks health — see `tc-broker`), so this reconciles the local
/// ledger against itself: the stored position row versus what a clean
/// replay of `executions` for that `(broker_account, symbol)` implies.
/// `apply` corrects drift in place; without it, drift is only reported.
pub async fn reconcile_trades(pool: &PgPool, apply: bool) -> Result<Vec<ReconcileDrift>> {
    let accounts = tc_db::list_active_mt5_accounts(pool).await?;
    let mut drift = Vec::new();

    for account in accounts {
        let positions = tc_db::list_open_positions_for_account(pool, account.id).await?;
        for mut position in positions {
            let fills = tc_db::list_fills_for_account_symbol(pool, account.id, &position.symbol).await?;
            let replay = tc_portfolio::replay_fills(&as_fill_tuples(&fills));

            if replay.qty != position.qty {
                drift.push(ReconcileDrift {
                    broker_account_id: account.id,
                    symbol: position.symbol.clone(),
                    stored_qty: position.qty,
                    implied_qty: replay.qty,
                });

                if apply {
                    position.qty = replay.qty;
                    position.avg_price = replay.avg_price;
                    if position.qty.is_zero() {
                        position.close();
                    }
                    tc_db::save_position(pool, &position).await.context("applying reconcile drift")?;
                }
            }
        }
    }

    Ok(drift)
}

#[derive(Debug, Default)]
pub struct RecomputeOutcome {
    pub recomputed: usize,
    pub skipped_no_fills: usize,
}

/// Recomputes realized PnL for every closed position with execution
/// activity in the lookback window and appends a fresh `trade_logs` entry
/// with the corrected figure. `trade_logs` is append-only by convention in
/// this schema, so this never mutates a prior entry — it lays down a new
/// one attributed to the position's most recent order, the same "latest
/// wins" convention `tc-db` uses elsewhere for reconciliation output.
pub async fn recompute_pnl_from_positions(pool: &PgPool, days: i64) -> Result<RecomputeOutcome> {
    let since = Utc::now() - chrono::Duration::days(days);
    let positions = tc_db::list_closed_positions_with_recent_executions(pool, since).await?;

    let mut outcome = RecomputeOutcome::default();
    for position in positions {
        let fills = tc_db::list_fills_for_account_symbol(pool, position.broker_account_id, &position.symbol).await?;
        let Some(last) = fills.last() else {
            outcome.skipped_no_fills += 1;
            continue;
        };
        let (order_id, bot_id) = (last.order_id, last.bot_id);

        let replay = tc_portfolio::replay_fills(&as_fill_tuples(&fills));
        let entry = tc_schemas::TradeLog {
            id: Uuid::new_v4(),
            order_id,
            bot_id,
            status: tc_portfolio::trade_log_status_for_pnl(replay.realized_pnl),
            pnl: Some(replay.realized_pnl),
            recorded_at: Utc::now(),
        };
        tc_db::insert_trade_log(pool, &entry).await?;
        outcome.recomputed += 1;
    }

    Ok(outcome)
}

#[derive(Debug, Default)]
pub struct PerformanceReport {
    pub total: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_bot: BTreeMap<Uuid, usize>,
}

fn status_label(status: TradeLogStatus) -> &'static str {
    match status {
        TradeLogStatus::New => "new",
        TradeLogStatus::Ack => "ack",
        TradeLogStatus::Filled => "filled",
        TradeLogStatus::PartFilled => "part_filled",
        TradeLogStatus::Canceled => "canceled",
        TradeLogStatus::Error => "error",
        TradeLogStatus::Win => "win",
        TradeLogStatus::Loss => "loss",
        TradeLogStatus::Breakeven => "breakeven",
    }
}

pub async fn performance_report(pool: &PgPool, days: i64) -> Result<PerformanceReport> {
    let since = Utc::now() - chrono::Duration::days(days);
    let logs = tc_db::list_trade_logs_since(pool, since).await?;

    let mut report = PerformanceReport { total: logs.len(), ..Default::default() };
    for log in &logs {
        *report.by_status.entry(status_label(log.status)).or_insert(0) += 1;
        *report.by_bot.entry(log.bot_id).or_insert(0) += 1;
    }
    Ok(report)
}

fn as_fill_tuples(fills: &[tc_db::PositionFill]) -> Vec<(OrderSide, Decimal8, Decimal8)> {
    fills.iter().map(|f| (f.side, f.qty, f.price)).collect()
}
