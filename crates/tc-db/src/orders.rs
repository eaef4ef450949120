use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tc_primitives::Decimal8;
use tc_schemas::{Order, OrderSide, OrderStatus};
use uuid::Uuid;

fn side_str(s: OrderSide) -> &'static str {
    match s {
        OrderSide::Buy => "buy",
        OrderSide::Sell => "sell",
    }
}

fn parse_side(s: &str) -> Result<OrderSide> {
    match s {
        "buy" => Ok(OrderSide::Buy),
        "sell" => Ok(OrderSide::Sell),
        other => anyhow::bail!("unknown order side: {other}"),
    }
}

fn status_str(s: OrderStatus) -> &'static str {
    match s {
        OrderStatus::New => "new",
        OrderStatus::Ack => "ack",
        OrderStatus::Filled => "filled",
        OrderStatus::PartFilled => "part_filled",
        OrderStatus::Canceled => "canceled",
        OrderStatus::Error => "error",
    }
}

fn parse_status(s: &str) -> Result<OrderStatus> {
    match s {
        "new" => Ok(OrderStatus::New),
        "ack" => Ok(OrderStatus::Ack),
        "filled" => Ok(OrderStatus::Filled),
        "part_filled" => Ok(OrderStatus::PartFilled),
        "canceled" => Ok(OrderStatus::Canceled),
        "error" => Ok(OrderStatus::Error),
        other => anyhow::bail!("unknown order status: {other}"),
    }
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<Order> {
    Ok(Order {
        id: row.try_get("id")?,
        bot_id: row.try_get("bot_id")?,
        broker_account_id: row.try_get("broker_account_id")?,
        client_order_id: row.try_get("client_order_id")?,
        broker_order_id: row.try_get("broker_order_id")?,
        symbol: row.try_get("symbol")?,
        side: parse_side(&row.try_get::<String, _>("side")?)?,
        qty: Decimal8::new(row.try_get("qty_raw")?),
        price: row.try_get::<Option<i64>, _>("price_raw")?.map(Decimal8::new),
        sl: row.try_get::<Option<i64>, _>("sl_raw")?.map(Decimal8::new),
        tp: row.try_get::<Option<i64>, _>("tp_raw")?.map(Decimal8::new),
        status: parse_status(&row.try_get::<String, _>("status")?)?,
        last_error: row.try_get("last_error")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub enum UpsertOutcome {
    Inserted(Order),
    AlreadyExisted(Order),
}

impl UpsertOutcome {
    pub fn into_order(self) -> Order {
        match self {
            UpsertOutcome::Inserted(o) | UpsertOutcome::AlreadyExisted(o) => o,
        }
    }
}

/// Atomic upsert keyed on `client_order_id`: the second caller to race on
/// the same deterministic id gets the row the first caller created, never
/// a duplicate. Mirrors the idempotent-enqueue shape used everywhere else
/// order intents hit this database.
pub async fn upsert_order_atomic(pool: &PgPool, order: &Order) -> Result<UpsertOutcome> {
    let inserted = sqlx::query(
        r#"
        insert into orders (
          id, bot_id, broker_account_id, client_order_id, broker_order_id, symbol, side,
          qty_raw, price_raw, sl_raw, tp_raw, status, last_error, created_at, updated_at
        ) values (
          $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15
        )
        on conflict (client_order_id) do nothing
        returning *
        "#,
    )
    .bind(order.id)
    .bind(order.bot_id)
    .bind(order.broker_account_id)
    .bind(&order.client_order_id)
    .bind(&order.broker_order_id)
    .bind(&order.symbol)
    .bind(side_str(order.side))
    .bind(order.qty.raw())
    .bind(order.price.map(|p| p.raw()))
    .bind(order.sl.map(|p| p.raw()))
    .bind(order.tp.map(|p| p.raw()))
    .bind(status_str(order.status))
    .bind(&order.last_error)
    .bind(order.created_at)
    .bind(order.updated_at)
    .fetch_optional(pool)
    .await
    .context("upsert_order_atomic insert failed")?;

    if let Some(row) = inserted {
        return Ok(UpsertOutcome::Inserted(row_to_order(&row)?));
    }

    let existing = fetch_order_by_client_order_id(pool, &order.client_order_id)
        .await?
        .context("upsert_order_atomic: conflicting row vanished before re-read")?;
    Ok(UpsertOutcome::AlreadyExisted(existing))
}

pub async fn fetch_order_by_client_order_id(pool: &PgPool, client_order_id: &str) -> Result<Option<Order>> {
    let row = sqlx::query("select * from orders where client_order_id = $1")
        .bind(client_order_id)
        .fetch_optional(pool)
        .await
        .context("fetch_order_by_client_order_id failed")?;
    row.as_ref().map(row_to_order).transpose()
}

pub async fn fetch_order(pool: &PgPool, id: Uuid) -> Result<Option<Order>> {
    let row = sqlx::query("select * from orders where id = $1").bind(id).fetch_optional(pool).await.context("fetch_order failed")?;
    row.as_ref().map(row_to_order).transpose()
}

/// Apply a status transition inside a row-locked transaction, enforcing
/// `Order::can_transition_to` before the write lands. Returns the order as
/// it stood after the transition, or the original transition error if the
/// table's allowed-transitions invariant would be violated.
pub async fn transition_order_status(pool: &PgPool, id: Uuid, next: OrderStatus, last_error: Option<&str>, now: DateTime<Utc>) -> Result<Order> {
    let mut tx = pool.begin().await.context("transition_order_status begin failed")?;

    let row = sqlx::query("select * from orders where id = $1 for update").bind(id).fetch_one(&mut *tx).await.context("transition_order_status lock failed")?;
    let mut order = row_to_order(&row)?;

    order.transition(next, now).context("order status transition rejected")?;
    order.last_error = last_error.map(str::to_string).or(order.last_error);

    sqlx::query("update orders set status = $2, last_error = $3, updated_at = $4 where id = $1")
        .bind(order.id)
        .bind(status_str(order.status))
        .bind(&order.last_error)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .context("transition_order_status update failed")?;

    tx.commit().await.context("transition_order_status commit failed")?;
    Ok(order)
}

pub async fn set_order_broker_fields(pool: &PgPool, id: Uuid, broker_order_id: Option<&str>, sl: Option<Decimal8>, tp: Option<Decimal8>, now: DateTime<Utc>) -> Result<()> {
    sqlx::query("update orders set broker_order_id = coalesce($2, broker_order_id), sl_raw = $3, tp_raw = $4, updated_at = $5 where id = $1")
        .bind(id)
        .bind(broker_order_id)
        .bind(sl.map(|v| v.raw()))
        .bind(tp.map(|v| v.raw()))
        .bind(now)
        .execute(pool)
        .await
        .context("set_order_broker_fields failed")?;
    Ok(())
}

/// Orders touching `(bot_id, symbol)` updated within the last `since`,
/// newest first — backs `tc_execution::should_skip_for_cooldown` and the
/// reconcile-close grace-period check.
pub async fn list_recent_orders_for_bot_symbol(pool: &PgPool, bot_id: Uuid, symbol: &str, since: DateTime<Utc>) -> Result<Vec<Order>> {
    let rows = sqlx::query("select * from orders where bot_id = $1 and symbol = $2 and updated_at >= $3 order by updated_at desc")
        .bind(bot_id)
        .bind(symbol)
        .bind(since)
        .fetch_all(pool)
        .await
        .context("list_recent_orders_for_bot_symbol failed")?;
    rows.iter().map(row_to_order).collect()
}

/// Every order not yet in a terminal state, regardless of age — the local
/// side of the paper-broker reconcile comparison (`tc_reconcile::engine`),
/// which needs the full non-terminal set rather than a stale-order window.
pub async fn list_non_terminal_orders(pool: &PgPool) -> Result<Vec<Order>> {
    let rows = sqlx::query("select * from orders where status in ('new','ack','part_filled') order by updated_at asc")
        .fetch_all(pool)
        .await
        .context("list_non_terminal_orders failed")?;
    rows.iter().map(row_to_order).collect()
}

/// Non-terminal orders older than `older_than` — backs
/// `tc_monitor::cancel_if_stale`.
pub async fn list_stale_open_orders(pool: &PgPool, older_than: DateTime<Utc>) -> Result<Vec<Order>> {
    let rows = sqlx::query("select * from orders where status in ('new','ack','part_filled') and updated_at < $1 order by updated_at asc")
        .bind(older_than)
        .fetch_all(pool)
        .await
        .context("list_stale_open_orders failed")?;
    rows.iter().map(row_to_order).collect()
}
