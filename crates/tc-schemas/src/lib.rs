//! The entity model shared by every crate downstream of a signal: assets,
//! broker accounts, bots, signals, decisions, orders, executions, positions,
//! trade logs, and daily PnL rollups. This crate owns no behavior beyond
//! small invariant-preserving constructors and status-transition tables —
//! the pipelines that produce and consume these entities live in
//! `tc-strategy`, `tc-decision`, `tc-execution`, and `tc-portfolio`.

pub mod asset;
pub mod bot;
pub mod broker_account;
pub mod decision;
pub mod error;
pub mod execution;
pub mod order;
pub mod pnl_daily;
pub mod position;
pub mod signal;
pub mod trade_log;

pub use asset::{Asset, AssetCategory};
pub use bot::{AllocationState, Bot, BotStatus, EngineMode, PsychologyState, RiskCaps, TradingWindow};
pub use broker_account::BrokerAccount;
pub use decision::{Decision, DecisionAction, DecisionParams};
pub use error::DomainError;
pub use execution::Execution;
pub use order::{Order, OrderSide, OrderStatus};
pub use pnl_daily::PnLDaily;
pub use position::{Position, PositionStatus};
pub use signal::{Signal, SignalDirection};
pub use trade_log::{TradeLog, TradeLogStatus};
