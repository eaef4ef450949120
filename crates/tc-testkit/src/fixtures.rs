//! Entity builders shared by every crate's test suite. Every builder takes
//! `now`/ids explicitly rather than reading the wall clock or generating its
//! own randomness internally — the same determinism rule the teacher's
//! paper-broker testkit follows, so a scenario assembled from these fixtures
//! replays identically on every run.

use chrono::{DateTime, Utc};
use tc_primitives::Decimal8;
use tc_schemas::bot::{AllocationState, PsychologyState, RiskCaps};
use tc_schemas::{
    Asset, AssetCategory, Bot, BotStatus, BrokerAccount, EngineMode, Execution, Order, OrderSide, OrderStatus, Position,
    PositionStatus, TradeLog, TradeLogStatus, TradingWindow,
};
use uuid::Uuid;

pub fn broker_account() -> BrokerAccount {
    BrokerAccount {
        id: Uuid::new_v4(),
        broker_code: "mt5".to_string(),
        credentials: "ciphertext".to_string(),
        is_active: true,
        is_verified: true,
        base_currency: "USD".to_string(),
        leverage: 100,
    }
}

/// Wide-open limits by default: `max_spread`/`min_notional` shouldn't reject
/// a well-formed test order unless the test narrows them on purpose.
pub fn asset(symbol: &str) -> Asset {
    Asset {
        symbol: symbol.to_string(),
        category: AssetCategory::Forex,
        min_qty: Decimal8::from_f64(0.01),
        recommended_qty: Decimal8::from_f64(0.1),
        max_spread: Decimal8::from_f64(0.01),
        min_notional: Decimal8::ZERO,
        is_active: true,
    }
}

/// A tradeable bot with every guard rail wide open; tests that exercise a
/// specific guard should narrow the field they care about.
pub fn bot(broker_account_id: Uuid, symbol: &str) -> Bot {
    Bot {
        id: Uuid::new_v4(),
        owner: "tester".to_string(),
        name: format!("{symbol}-bot"),
        asset_symbol: symbol.to_string(),
        broker_account_id,
        status: BotStatus::Active,
        auto_trade: true,
        engine_mode: EngineMode::External,
        default_timeframe: "M15".to_string(),
        default_qty: Decimal8::from_f64(0.1),
        allowed_timeframes: vec!["M15".to_string()],
        enabled_strategies: vec!["harami".to_string()],
        decision_min_score: 0.5,
        risk_caps: RiskCaps { max_concurrent_positions: 3, max_trades_per_day: 10, trade_interval_minutes: 15 },
        trading_window: TradingWindow::always_on(),
        psychology: PsychologyState {
            current_loss_streak: 0,
            paused_until: None,
            max_loss_streak_before_pause: 3,
            loss_streak_cooldown_min: 60,
            soft_drawdown_limit_pct: Decimal8::from_f64(0.05),
            hard_drawdown_limit_pct: Decimal8::from_f64(0.10),
            soft_size_multiplier: Decimal8::from_f64(0.5),
            hard_size_multiplier: Decimal8::ZERO,
        },
        allocation: AllocationState {
            allocation_amount: Decimal8::from_f64(1000.0),
            allocation_profit_pct: Decimal8::from_f64(0.2),
            allocation_loss_pct: Decimal8::from_f64(0.1),
            allocation_start_pnl: Decimal8::ZERO,
            allocation_started_at: None,
            allocation_guard_tripped: false,
        },
        scalper_params: serde_json::Value::Null,
        last_htf_bias: None,
    }
}

pub fn order(bot_id: Uuid, broker_account_id: Uuid, symbol: &str, side: OrderSide, qty: Decimal8, now: DateTime<Utc>) -> Order {
    Order {
        id: Uuid::new_v4(),
        bot_id,
        broker_account_id,
        client_order_id: format!("test|{}", Uuid::new_v4()),
        broker_order_id: None,
        symbol: symbol.to_string(),
        side,
        qty,
        price: None,
        sl: None,
        tp: None,
        status: OrderStatus::New,
        last_error: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn flat_position(broker_account_id: Uuid, symbol: &str) -> Position {
    Position {
        id: Uuid::new_v4(),
        broker_account_id,
        symbol: symbol.to_string(),
        qty: Decimal8::ZERO,
        avg_price: Decimal8::ZERO,
        sl: None,
        tp: None,
        status: PositionStatus::Closed,
    }
}

pub fn execution(order_id: Uuid, qty: Decimal8, price: Decimal8, now: DateTime<Utc>) -> Execution {
    Execution { id: Uuid::new_v4(), order_id, qty, price, fee: Decimal8::ZERO, exec_time: now, account_balance_after: None }
}

pub fn trade_log(order_id: Uuid, bot_id: Uuid, status: TradeLogStatus, pnl: Option<Decimal8>, now: DateTime<Utc>) -> TradeLog {
    TradeLog { id: Uuid::new_v4(), order_id, bot_id, status, pnl, recorded_at: now }
}
