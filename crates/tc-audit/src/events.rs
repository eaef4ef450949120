//! Typed constructors for the audit topics an operator needs to reconstruct
//! *why* an automated action happened. Each wraps [`AuditWriter::append`] with
//! a fixed topic/event_type pair and a payload shape, so call sites can't typo
//! an event name or omit a field the operator tooling expects.

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

use crate::journal::{AuditEvent, AuditWriter};

const TOPIC_LIFECYCLE: &str = "LIFECYCLE";
const TOPIC_ALLOCATION: &str = "ALLOCATION";
const TOPIC_EXECUTION: &str = "EXECUTION";
const TOPIC_MARKET_GUARD: &str = "MARKET_GUARD";

impl AuditWriter {
    pub fn bot_created(&mut self, bot_id: Uuid, owner: &str, name: &str) -> Result<AuditEvent> {
        self.append(Some(bot_id), TOPIC_LIFECYCLE, "bot.created", json!({"owner": owner, "name": name}))
    }

    pub fn allocation_cap_hit(&mut self, bot_id: Uuid, cap_pct: f64, realized_pnl_pct: f64) -> Result<AuditEvent> {
        self.append(
            Some(bot_id),
            TOPIC_ALLOCATION,
            "allocation.cap_hit",
            json!({"cap_pct": cap_pct, "realized_pnl_pct": realized_pnl_pct}),
        )
    }

    pub fn allocation_balance_insufficient(&mut self, bot_id: Uuid, requested_qty: f64, available: f64) -> Result<AuditEvent> {
        self.append(
            Some(bot_id),
            TOPIC_ALLOCATION,
            "allocation.balance_insufficient",
            json!({"requested_qty": requested_qty, "available": available}),
        )
    }

    pub fn order_error(&mut self, bot_id: Uuid, order_id: Uuid, error: &str) -> Result<AuditEvent> {
        self.append(Some(bot_id), TOPIC_EXECUTION, "order.error", json!({"order_id": order_id, "error": error}))
    }

    pub fn market_guard_stop(&mut self, bot_id: Uuid, reason: &str) -> Result<AuditEvent> {
        self.append(Some(bot_id), TOPIC_MARKET_GUARD, "market_guard.stop", json!({"reason": reason}))
    }

    pub fn market_guard_resume(&mut self, bot_id: Uuid) -> Result<AuditEvent> {
        self.append(Some(bot_id), TOPIC_MARKET_GUARD, "market_guard.resume", json!({}))
    }

    /// Not bot-scoped: a scheduled task runs across many bots at once.
    pub fn task_failure(&mut self, task_name: &str, error: &str) -> Result<AuditEvent> {
        self.append(None, TOPIC_LIFECYCLE, "task.failure", json!({"task": task_name, "error": error}))
    }
}
