use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tc_primitives::Decimal8;
use tc_schemas::{Position, PositionStatus};
use uuid::Uuid;

fn status_str(s: PositionStatus) -> &'static str {
    match s {
        PositionStatus::Open => "open",
        PositionStatus::Closed => "closed",
    }
}

fn parse_status(s: &str) -> Result<PositionStatus> {
    match s {
        "open" => Ok(PositionStatus::Open),
        "closed" => Ok(PositionStatus::Closed),
        other => anyhow::bail!("unknown position status: {other}"),
    }
}

fn row_to_position(row: &sqlx::postgres::PgRow) -> Result<Position> {
    Ok(Position {
        id: row.try_get("id")?,
        broker_account_id: row.try_get("broker_account_id")?,
        symbol: row.try_get("symbol")?,
        qty: Decimal8::new(row.try_get("qty_raw")?),
        avg_price: Decimal8::new(row.try_get("avg_price_raw")?),
        sl: row.try_get::<Option<i64>, _>("sl_raw")?.map(Decimal8::new),
        tp: row.try_get::<Option<i64>, _>("tp_raw")?.map(Decimal8::new),
        status: parse_status(&row.try_get::<String, _>("status")?)?,
    })
}

/// Whole-row replace, keyed on `(broker_account_id, symbol)`. Positions
/// have no append-only history of their own — `executions` carries that —
/// so the latest state always simply overwrites the last.
pub async fn save_position(pool: &PgPool, position: &Position) -> Result<()> {
    sqlx::query(
        r#"
        insert into positions (id, broker_account_id, symbol, qty_raw, avg_price_raw, sl_raw, tp_raw, status)
        values ($1, $2, $3, $4, $5, $6, $7, $8)
        on conflict (broker_account_id, symbol) do update set
          qty_raw = excluded.qty_raw, avg_price_raw = excluded.avg_price_raw,
          sl_raw = excluded.sl_raw, tp_raw = excluded.tp_raw, status = excluded.status
        "#,
    )
    .bind(position.id)
    .bind(position.broker_account_id)
    .bind(&position.symbol)
    .bind(position.qty.raw())
    .bind(position.avg_price.raw())
    .bind(position.sl.map(|v| v.raw()))
    .bind(position.tp.map(|v| v.raw()))
    .bind(status_str(position.status))
    .execute(pool)
    .await
    .context("save_position failed")?;
    Ok(())
}

pub async fn fetch_position(pool: &PgPool, broker_account_id: Uuid, symbol: &str) -> Result<Option<Position>> {
    let row = sqlx::query("select * from positions where broker_account_id = $1 and symbol = $2")
        .bind(broker_account_id)
        .bind(symbol)
        .fetch_optional(pool)
        .await
        .context("fetch_position failed")?;
    row.as_ref().map(row_to_position).transpose()
}

pub async fn list_open_positions_for_account(pool: &PgPool, broker_account_id: Uuid) -> Result<Vec<Position>> {
    let rows = sqlx::query("select * from positions where broker_account_id = $1 and status = 'open' order by symbol asc")
        .bind(broker_account_id)
        .fetch_all(pool)
        .await
        .context("list_open_positions_for_account failed")?;
    rows.iter().map(row_to_position).collect()
}

/// Positions stuck at `open` with zero quantity — drift from a partial
/// write or a crash mid-fill, since `apply_fill` itself always closes a
/// position the instant it nets to flat. Backs `cleanup_positions`.
pub async fn list_flat_open_positions(pool: &PgPool) -> Result<Vec<Position>> {
    let rows = sqlx::query("select * from positions where status = 'open' and qty_raw = 0 order by symbol asc")
        .fetch_all(pool)
        .await
        .context("list_flat_open_positions failed")?;
    rows.iter().map(row_to_position).collect()
}

/// Closed positions that have at least one execution since `since`.
/// Positions carry no timestamp of their own (whole-row replace, no
/// history) so recency is inferred through the orders/executions that
/// fed them — backs `recompute_pnl_from_positions`.
pub async fn list_closed_positions_with_recent_executions(pool: &PgPool, since: chrono::DateTime<chrono::Utc>) -> Result<Vec<Position>> {
    let rows = sqlx::query(
        r#"
        select distinct p.*
        from positions p
        join orders o on o.broker_account_id = p.broker_account_id and o.symbol = p.symbol
        join executions e on e.order_id = o.id
        where p.status = 'closed' and e.exec_time >= $1
        order by p.symbol asc
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .context("list_closed_positions_with_recent_executions failed")?;
    rows.iter().map(row_to_position).collect()
}
