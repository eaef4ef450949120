//! Order orchestration: decision/position to order, deterministic
//! idempotency keys, cooldown/redispatch policy, and broker dispatch with
//! status-transition bookkeeping. This is the only place a `Decision`
//! becomes an `Order` on the wire.

pub mod bracket;
pub mod keys;
pub mod orchestrator;

pub use bracket::fallback_brackets;
pub use keys::{close_order_key, open_order_key};
pub use orchestrator::{
    create_close_from_position, create_from_decision, dispatch, is_open_decision, plan_redispatch, should_skip_for_cooldown,
    RecentOrder, RedispatchPlan,
};
