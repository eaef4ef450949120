//! Background scheduler loops. Each task is a thin IO wrapper around a pure
//! `tc-monitor`/`tc-decision`/`tc-execution` function: fetch candidates,
//! apply the pure decision, persist, audit on failure. Cadences are
//! grounded in the source system's own Celery Beat periods
//! (`cancel_stale_orders_task`, `market_hours_guard_task` both ran on short
//! fixed intervals measured in tens of seconds to a few minutes — see
//! `execution/tasks.py`).
//!
//! Live broker-session tasks (a real MT5 round trip) are deliberately NOT
//! scheduled here: they need decrypted credentials, and this process is the
//! always-on HTTP ingress. They run instead as the operator-invoked
//! `reconcile_trades` command. The engine's own decision/fill/position
//! cycle below dispatches exclusively through the in-process paper broker
//! held in `AppState` — there is no production MT5 session anywhere in
//! this workspace for it to use instead, and fabricating one here would
//! just move the same gap somewhere less honest about it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tc_broker::PaperBroker;
use tc_decision::{DecisionContext, DecisionRuntimeConfig};
use tc_monitor::{apply_market_guard, cancel_if_stale, evaluate_tick, GuardAction, TickAction, TickInputs};
use tc_primitives::Decimal8;
use tc_reconcile::SnapshotWatermark;
use tc_risk::AllocationVerdict;
use tc_schemas::{Bot, BrokerAccount, Decision, DecisionAction, EngineMode, Order, OrderSide, OrderStatus, Position, Signal};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::state::AppState;

pub const STALE_ORDER_CHECK_INTERVAL: Duration = Duration::from_secs(60);
pub const STALE_ORDER_TIMEOUT_SECONDS: i64 = 120;
pub const MARKET_GUARD_CHECK_INTERVAL: Duration = Duration::from_secs(300);
pub const DECISION_CYCLE_INTERVAL: Duration = Duration::from_secs(20);
pub const POSITION_POLICY_CHECK_INTERVAL: Duration = Duration::from_secs(30);
pub const PAPER_RECONCILE_INTERVAL: Duration = Duration::from_secs(60);

/// How far back an undecided signal can be and still be picked up — a
/// signal older than this has already missed its trading window.
const UNDECIDED_SIGNAL_LOOKBACK_HOURS: i64 = 24;

/// Position-policy thresholds. No per-symbol config surface for these
/// exists yet (`tc_scalper::ScalperConfig` covers planner sizing, not
/// in-trade management) so they're fixed constants here, matching the
/// fixed-constant cadence/timeout style already used in this file.
const POSITION_EARLY_EXIT_MAX_UNREALIZED_PCT: f64 = 0.05;
const POSITION_KILL_SWITCH_MAX_UNREALIZED_PCT: f64 = 0.02;
const POSITION_TRAILING_TRIGGER: f64 = 0.01;
const POSITION_TRAILING_DISTANCE: f64 = 0.005;

pub fn spawn_all(state: Arc<AppState>) {
    spawn_loop(Arc::clone(&state), STALE_ORDER_CHECK_INTERVAL, "cancel_stuck_orders", cancel_stuck_orders_once);
    spawn_loop(Arc::clone(&state), MARKET_GUARD_CHECK_INTERVAL, "market_hours_guard", market_hours_guard_once);
    spawn_loop(Arc::clone(&state), DECISION_CYCLE_INTERVAL, "engine_decision_cycle", engine_decision_cycle_once);
    spawn_loop(Arc::clone(&state), POSITION_POLICY_CHECK_INTERVAL, "position_policy_tick", position_policy_tick_once);
    spawn_loop(state, PAPER_RECONCILE_INTERVAL, "paper_broker_reconcile", paper_broker_reconcile_once);
}

fn spawn_loop<F>(state: Arc<AppState>, interval: Duration, task_name: &'static str, run_once: F)
where
    F: Fn(Arc<AppState>) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>> + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = run_once(Arc::clone(&state)).await {
                error!(task = task_name, error = %e, "scheduled task failed");
                let mut audit = state.audit.lock().await;
                let _ = audit.task_failure(task_name, &e.to_string());
            }
        }
    });
}

fn cancel_stuck_orders_once(state: Arc<AppState>) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>> {
    Box::pin(async move { cancel_stuck_orders(&state.pool).await })
}

fn market_hours_guard_once(state: Arc<AppState>) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>> {
    Box::pin(async move { market_hours_guard(&state.pool).await })
}

fn engine_decision_cycle_once(state: Arc<AppState>) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>> {
    Box::pin(async move { engine_decision_cycle(&state.pool, &state.paper_broker).await })
}

fn position_policy_tick_once(state: Arc<AppState>) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>> {
    Box::pin(async move { position_policy_tick(&state.pool).await })
}

fn paper_broker_reconcile_once(state: Arc<AppState>) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>> {
    Box::pin(async move { paper_broker_reconcile(&state.pool, &state.paper_broker, &state.reconcile_watermark).await })
}

/// Backs the `cancel_stuck_orders` CLI command and the daemon's own
/// background cadence — both call this, so "run it from the CLI" and "let
/// the daemon handle it" are the exact same code path.
pub async fn cancel_stuck_orders(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let cutoff = now - chrono::Duration::seconds(STALE_ORDER_TIMEOUT_SECONDS);
    let candidates = tc_db::list_stale_open_orders(pool, cutoff).await?;

    for mut order in candidates {
        if cancel_if_stale(&mut order, now, STALE_ORDER_TIMEOUT_SECONDS) {
            tc_db::transition_order_status(pool, order.id, order.status, order.last_error.as_deref(), now).await?;
            info!(order_id = %order.id, symbol = %order.symbol, "canceled stale order");
        }
    }
    Ok(())
}

pub async fn market_hours_guard(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let bots = tc_db::list_active_bots(pool).await?;

    for mut bot in bots {
        let asset = match tc_db::fetch_asset(pool, &bot.asset_symbol).await? {
            Some(a) => a,
            None => continue,
        };

        match apply_market_guard(&mut bot, asset.category, now) {
            GuardAction::None => {}
            action @ (GuardAction::AutoStopped | GuardAction::AutoResumed) => {
                tc_db::save_bot_status(pool, bot.id, bot.status).await?;
                tc_db::save_bot_scalper_params(pool, bot.id, &bot.scalper_params).await?;
                info!(bot_id = %bot.id, ?action, "market guard applied");
            }
        }
    }
    Ok(())
}

/// Which bot owns a signal: the explicit `bot_id` if the producer set one,
/// otherwise the first active, auto-trading bot configured for the
/// signal's symbol and timeframe.
async fn resolve_bot_for_signal(pool: &PgPool, signal: &Signal) -> anyhow::Result<Option<Bot>> {
    if let Some(bot_id) = signal.bot_id {
        return tc_db::fetch_bot(pool, bot_id).await;
    }
    let bots = tc_db::list_active_bots(pool).await?;
    Ok(bots.into_iter().find(|b| {
        b.auto_trade
            && b.asset_symbol.eq_ignore_ascii_case(&signal.symbol)
            && b.allowed_timeframes.iter().any(|tf| tf.eq_ignore_ascii_case(&signal.timeframe))
    }))
}

/// A reference price for fallback bracket/ATR-trailing math. No live tick
/// feed exists in this process, so this falls back through the last
/// recorded fill, then the position's own average price, and only then a
/// fixed placeholder — a documented simplification until a market-data
/// feed lands (see spec's market-data non-goal).
async fn reference_price(pool: &PgPool, account_id: uuid::Uuid, symbol: &str, position: &Option<Position>) -> anyhow::Result<Decimal8> {
    if let Some(last) = tc_db::list_fills_for_account_symbol(pool, account_id, symbol).await?.last() {
        return Ok(last.price);
    }
    if let Some(p) = position {
        if !p.avg_price.is_zero() {
            return Ok(p.avg_price);
        }
    }
    Ok(Decimal8::from_int(1))
}

/// Sum of every daily realized-PnL rollup ever recorded for this account
/// and symbol — the `lifetime_realized` the allocation guard compares its
/// baseline against. There is no dedicated running total stored anywhere,
/// so this replays the full `pnl_daily` history each cycle.
async fn lifetime_realized_pnl(pool: &PgPool, account_id: uuid::Uuid, symbol: &str) -> anyhow::Result<Decimal8> {
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid constant date");
    let rows = tc_db::list_pnl_daily_for_account_since(pool, account_id, epoch).await?;
    Ok(rows
        .iter()
        .filter(|row| row.symbol == symbol)
        .fold(Decimal8::ZERO, |acc, row| acc.saturating_add(row.realized)))
}

fn risk_block_reason(verdict: &AllocationVerdict) -> Option<String> {
    match verdict {
        AllocationVerdict::Tradeable => None,
        AllocationVerdict::NotActive => Some("bot_not_active".to_string()),
        AllocationVerdict::PsychologyPaused => Some("psychology_paused".to_string()),
        AllocationVerdict::MarketClosed => Some("market_closed".to_string()),
        AllocationVerdict::AlreadyStopped => Some("allocation_already_stopped".to_string()),
        AllocationVerdict::Stop { journal_event, .. } => Some((*journal_event).to_string()),
    }
}

/// Persist an order built by `tc_execution`, honoring the idempotent
/// `client_order_id` upsert: a brand-new row is trusted as-is, a row that
/// already existed (a race, or a redispatch after a reset) gets its
/// status/broker fields brought in line with what was just dispatched.
async fn persist_dispatched_order(pool: &PgPool, order: &Order, now: DateTime<Utc>) -> anyhow::Result<()> {
    match tc_db::upsert_order_atomic(pool, order).await? {
        tc_db::UpsertOutcome::Inserted(_) => {}
        tc_db::UpsertOutcome::AlreadyExisted(existing) => {
            if existing.status != order.status && existing.status.can_transition_to(order.status) {
                tc_db::transition_order_status(pool, existing.id, order.status, order.last_error.as_deref(), now).await?;
            }
            tc_db::set_order_broker_fields(pool, existing.id, order.broker_order_id.as_deref(), order.sl, order.tp, now).await?;
        }
    }
    Ok(())
}

/// Build, dispatch, and persist the open order for one decision. The
/// broker ACKs immediately; the resulting fill is picked up later by
/// [`drain_and_apply_paper_fills`] once its configured delay elapses.
async fn dispatch_open_order(
    pool: &PgPool,
    broker: &Arc<Mutex<PaperBroker>>,
    account: &BrokerAccount,
    asset: &tc_schemas::Asset,
    decision: &Decision,
    side: OrderSide,
    position: &Option<Position>,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let client_order_id = tc_execution::open_order_key(&decision.id, &account.id, &asset.symbol, "open");
    let existing = tc_db::fetch_order_by_client_order_id(pool, &client_order_id).await?;

    let recent = tc_db::list_recent_orders_for_bot_symbol(pool, decision.bot_id, &asset.symbol, now - chrono::Duration::minutes(5))
        .await?
        .into_iter()
        .max_by_key(|o| o.updated_at)
        .map(|o| tc_execution::RecentOrder { updated_at: o.updated_at, status: o.status });
    if tc_execution::should_skip_for_cooldown(recent, now, 30, 60) {
        return Ok(());
    }

    let mid_price = reference_price(pool, account.id, &asset.symbol, position).await?;
    let mut order = tc_execution::create_from_decision(decision, account.id, &asset.symbol, side, now, existing, mid_price, None);

    let (trade_log, _immediate_fill) = {
        let mut guard = broker.lock().await;
        tc_execution::dispatch(&mut *guard, account, asset, &mut order, now)
    };

    persist_dispatched_order(pool, &order, now).await?;
    tc_db::insert_trade_log(pool, &trade_log).await?;
    Ok(())
}

/// Build, dispatch, and persist the close order a flip pairs with its new
/// open — closing the old position before the new one can fill keeps the
/// paper broker's own bookkeeping from ever holding both sides at once.
async fn dispatch_flip_close(
    pool: &PgPool,
    broker: &Arc<Mutex<PaperBroker>>,
    account: &BrokerAccount,
    asset: &tc_schemas::Asset,
    position: &Position,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let client_order_id = tc_execution::close_order_key(&position.id, &position.broker_account_id, &position.symbol);
    let existing = tc_db::fetch_order_by_client_order_id(pool, &client_order_id).await?;
    let mut order = tc_execution::create_close_from_position(position, now, existing);

    let (trade_log, _immediate_fill) = {
        let mut guard = broker.lock().await;
        tc_execution::dispatch(&mut *guard, account, asset, &mut order, now)
    };

    persist_dispatched_order(pool, &order, now).await?;
    tc_db::insert_trade_log(pool, &trade_log).await?;
    Ok(())
}

/// Drive every undecided signal through `evaluate_signal`, persist the
/// resulting decision(s), and dispatch any open (or paired flip-close)
/// through the shared paper broker. Fills are not applied here — the
/// paper broker only ever ACKs a new order; [`drain_and_apply_paper_fills`]
/// below applies whatever becomes due.
pub async fn engine_decision_cycle(pool: &PgPool, broker: &Arc<Mutex<PaperBroker>>) -> anyhow::Result<()> {
    let now = Utc::now();
    let since = now - chrono::Duration::hours(UNDECIDED_SIGNAL_LOOKBACK_HOURS);
    let signals = tc_db::list_undecided_signals(pool, since).await?;

    for signal in signals {
        let mut bot = match resolve_bot_for_signal(pool, &signal).await? {
            Some(b) => b,
            None => continue,
        };
        let asset = match tc_db::fetch_asset(pool, &bot.asset_symbol).await? {
            Some(a) => a,
            None => continue,
        };
        let account = match tc_db::fetch_broker_account(pool, bot.broker_account_id).await? {
            Some(a) => a,
            None => continue,
        };

        let position = tc_db::fetch_position(pool, bot.broker_account_id, &bot.asset_symbol).await?;
        let balance = tc_db::fetch_pnl_daily(pool, bot.broker_account_id, &bot.asset_symbol, now.date_naive())
            .await?
            .map(|row| row.balance)
            .unwrap_or(Decimal8::MAX);
        let lifetime_realized = lifetime_realized_pnl(pool, bot.broker_account_id, &bot.asset_symbol).await?;
        let market_open = tc_scalper::market_status(tc_scalper::CalendarSpec::for_category(asset.category), now).is_open();

        let verdict = tc_risk::bot_is_available_for_trading(&mut bot, now, market_open, balance, lifetime_realized);
        if matches!(verdict, AllocationVerdict::Stop { .. }) {
            tc_db::save_bot_psychology_and_allocation(pool, bot.id, &bot.psychology, &bot.allocation).await?;
        }

        let day_start = now.date_naive().and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc();
        let recent_orders = tc_db::list_recent_orders_for_bot_symbol(pool, bot.id, &bot.asset_symbol, day_start).await?;
        let filled_orders_today = recent_orders.iter().filter(|o| o.status == OrderStatus::Filled).count() as i32;
        let minutes_since_last_open_decision =
            recent_orders.iter().filter(|o| !o.is_close()).map(|o| (now - o.created_at).num_minutes()).min();
        let flip_closes: Vec<&Order> = recent_orders.iter().filter(|o| o.is_close() && o.status == OrderStatus::Filled).collect();
        let minutes_since_last_flip_close = flip_closes.iter().map(|o| (now - o.created_at).num_minutes()).min();
        let flips_today = flip_closes.len() as i32;

        let ctx = DecisionContext {
            now,
            risk_block: risk_block_reason(&verdict),
            runtime: DecisionRuntimeConfig::default(),
            hedging_enabled: false,
            net_position_qty: position.as_ref().map(|p| p.qty).unwrap_or(Decimal8::ZERO),
            open_position_id: position.as_ref().filter(|p| !p.is_flat()).map(|p| p.id),
            bot_allows_opposite_scalp: bot.engine_mode == EngineMode::Scalper,
            filled_orders_today,
            max_trades_per_day: bot.risk_caps.max_trades_per_day,
            minutes_since_last_open_decision,
            trade_interval_minutes: bot.risk_caps.trade_interval_minutes,
            minutes_since_last_flip_close,
            flips_today,
        };

        let outcome = tc_decision::evaluate_signal(&signal, &bot, &ctx);
        if outcome.decision.action == DecisionAction::Ignore {
            info!(signal_id = %signal.id, bot_id = %bot.id, reason = %outcome.decision.reason, "signal ignored");
            continue;
        }
        tc_db::insert_decision(pool, &outcome.decision).await?;
        if let Some(close) = &outcome.flip_close {
            tc_db::insert_decision(pool, close).await?;
        }

        if outcome.flip_close.is_some() {
            if let Some(pos) = &position {
                dispatch_flip_close(pool, broker, &account, &asset, pos, now).await?;
            }
        }

        let side = match signal.direction {
            tc_schemas::SignalDirection::Buy => OrderSide::Buy,
            tc_schemas::SignalDirection::Sell => OrderSide::Sell,
        };
        dispatch_open_order(pool, broker, &account, &asset, &outcome.decision, side, &position, now).await?;
    }

    drain_and_apply_paper_fills(pool, broker, now).await?;
    Ok(())
}

/// Apply whatever fills have become due in the paper broker since the last
/// cycle: advance the order to `filled`, run the fill through
/// `tc-portfolio`, and persist the resulting position/execution/trade-log/
/// psychology rows.
async fn drain_and_apply_paper_fills(pool: &PgPool, broker: &Arc<Mutex<PaperBroker>>, now: DateTime<Utc>) -> anyhow::Result<()> {
    let fills = {
        let mut guard = broker.lock().await;
        guard.drain_due_fills(now)
    };

    for (client_order_id, qty, price) in fills {
        let order = match tc_db::fetch_order_by_client_order_id(pool, &client_order_id).await? {
            Some(o) => o,
            None => continue,
        };
        let order = match tc_db::transition_order_status(pool, order.id, OrderStatus::Filled, None, now).await {
            Ok(o) => o,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "paper fill could not transition order to filled");
                continue;
            }
        };

        let mut bot = match tc_db::fetch_bot(pool, order.bot_id).await? {
            Some(b) => b,
            None => continue,
        };
        let mut position = tc_db::fetch_position(pool, order.broker_account_id, &order.symbol)
            .await?
            .unwrap_or_else(|| Position::flat(order.broker_account_id, order.symbol.clone()));

        let global_risk = tc_risk::GlobalRiskSettings::unset();
        let result = tc_portfolio::process_fill(&mut bot, &global_risk, &mut position, &order, qty, price, Decimal8::ZERO, now);

        tc_db::save_position(pool, &position).await?;
        tc_db::insert_execution(pool, &result.execution).await?;
        tc_db::insert_trade_log(pool, &result.trade_log).await?;

        if result.psychology_update.is_some() {
            tc_db::save_bot_status(pool, bot.id, bot.status).await?;
            tc_db::save_bot_psychology_and_allocation(pool, bot.id, &bot.psychology, &bot.allocation).await?;
        }

        if let Some(pnl) = result.realized_pnl {
            let today = now.date_naive();
            let mut row = tc_db::fetch_pnl_daily(pool, order.broker_account_id, &order.symbol, today).await?.unwrap_or(tc_schemas::PnLDaily {
                broker_account_id: order.broker_account_id,
                symbol: order.symbol.clone(),
                date: today,
                realized: Decimal8::ZERO,
                unrealized: Decimal8::ZERO,
                fees: Decimal8::ZERO,
                balance: Decimal8::ZERO,
            });
            row.realized = row.realized.saturating_add(pnl);
            tc_db::upsert_pnl_daily(pool, &row).await?;
        }

        info!(order_id = %order.id, symbol = %order.symbol, %qty, %price, "paper fill applied");
    }
    Ok(())
}

/// Per-open-position early-exit/trailing/kill-switch tick. Close actions
/// only queue a close order here (status `new`) — dispatch happens on the
/// engine cycle above, keeping this step broker-free like every other task
/// in this file.
pub async fn position_policy_tick(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let bots = tc_db::list_active_bots(pool).await?;

    for bot in bots {
        let mut position = match tc_db::fetch_position(pool, bot.broker_account_id, &bot.asset_symbol).await? {
            Some(p) if !p.is_flat() => p,
            _ => continue,
        };

        let mid_price = reference_price(pool, bot.broker_account_id, &bot.asset_symbol, &Some(position.clone())).await?;
        let inputs = TickInputs {
            mid_price,
            atr: None,
            early_exit_max_unrealized_pct: Decimal8::from_f64(POSITION_EARLY_EXIT_MAX_UNREALIZED_PCT),
            trailing_trigger: Decimal8::from_f64(POSITION_TRAILING_TRIGGER),
            trailing_distance: Decimal8::from_f64(POSITION_TRAILING_DISTANCE),
            kill_switch_max_unrealized_pct: Decimal8::from_f64(POSITION_KILL_SWITCH_MAX_UNREALIZED_PCT),
            engine_confirms_opposite: false,
        };

        match evaluate_tick(&position, &inputs) {
            TickAction::Hold => {}
            TickAction::UpdateStop { new_sl } => {
                position.sl = Some(new_sl);
                tc_db::save_position(pool, &position).await?;
                info!(symbol = %position.symbol, %new_sl, "trailing stop advanced");
            }
            TickAction::Close { reason } => {
                let client_order_id = tc_execution::close_order_key(&position.id, &position.broker_account_id, &position.symbol);
                let existing = tc_db::fetch_order_by_client_order_id(pool, &client_order_id).await?;
                let close_order = tc_execution::create_close_from_position(&position, now, existing);
                persist_dispatched_order(pool, &close_order, now).await?;
                info!(symbol = %position.symbol, reason, "position-policy close order queued");
            }
        }
    }
    Ok(())
}

/// Compare the paper broker's own in-memory open tickets against the
/// database's non-terminal orders. The broker's memory does not survive a
/// daemon restart; the database does — so a clean reconcile here is a real
/// statement about crash-recovery drift, not a vacuous self-comparison.
pub async fn paper_broker_reconcile(pool: &PgPool, broker: &Arc<Mutex<PaperBroker>>, watermark: &Arc<Mutex<SnapshotWatermark>>) -> anyhow::Result<()> {
    let now = Utc::now();
    let tickets = {
        let guard = broker.lock().await;
        guard.open_tickets()
    };

    let mut broker_snapshot = tc_reconcile::BrokerSnapshot::empty(now.timestamp_millis());
    for (client_order_id, symbol, side, qty) in tickets {
        broker_snapshot.orders.insert(
            client_order_id.clone(),
            tc_reconcile::OrderSnapshot { order_id: client_order_id, symbol, side, qty, status: OrderStatus::Ack },
        );
    }

    let mut local_snapshot = tc_reconcile::LocalSnapshot::empty();
    for order in tc_db::list_non_terminal_orders(pool).await? {
        local_snapshot.orders.insert(
            order.client_order_id.clone(),
            tc_reconcile::OrderSnapshot { order_id: order.client_order_id, symbol: order.symbol, side: order.side, qty: order.qty, status: order.status },
        );
    }

    let mut wm = watermark.lock().await;
    let report = match tc_reconcile::reconcile_monotonic(&mut wm, &local_snapshot, &broker_snapshot) {
        Ok(report) => report,
        Err(stale) => {
            warn!(error = %stale, "paper broker reconcile snapshot rejected as stale");
            return Ok(());
        }
    };
    drop(wm);

    if !report.is_clean() {
        warn!(reasons = ?report.reasons, diffs = ?report.diffs, "paper broker/db order drift detected");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tradeable_verdict_blocks_nothing() {
        assert_eq!(risk_block_reason(&AllocationVerdict::Tradeable), None);
    }

    #[test]
    fn stop_verdict_carries_its_journal_event_as_the_block_reason() {
        let verdict = AllocationVerdict::Stop { journal_event: "allocation_cap_hit", new_allocation_start_pnl: None };
        assert_eq!(risk_block_reason(&verdict), Some("allocation_cap_hit".to_string()));
    }

    #[test]
    fn every_non_tradeable_verdict_yields_a_distinct_reason() {
        let reasons = [
            risk_block_reason(&AllocationVerdict::NotActive),
            risk_block_reason(&AllocationVerdict::PsychologyPaused),
            risk_block_reason(&AllocationVerdict::MarketClosed),
            risk_block_reason(&AllocationVerdict::AlreadyStopped),
        ];
        assert!(reasons.iter().all(Option::is_some));
        let unique: std::collections::HashSet<_> = reasons.iter().collect();
        assert_eq!(unique.len(), reasons.len());
    }
}
