use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tc_primitives::Decimal8;
use tc_schemas::{TradeLog, TradeLogStatus};
use uuid::Uuid;

fn status_str(s: TradeLogStatus) -> &'static str {
    match s {
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

fn parse_status(s: &str) -> Result<TradeLogStatus> {
    match s {
        "new" => Ok(TradeLogStatus::New),
        "ack" => Ok(TradeLogStatus::Ack),
        "filled" => Ok(TradeLogStatus::Filled),
        "part_filled" => Ok(TradeLogStatus::PartFilled),
        "canceled" => Ok(TradeLogStatus::Canceled),
        "error" => Ok(TradeLogStatus::Error),
        "win" => Ok(TradeLogStatus::Win),
        "loss" => Ok(TradeLogStatus::Loss),
        "breakeven" => Ok(TradeLogStatus::Breakeven),
        other => anyhow::bail!("unknown trade log status: {other}"),
    }
}

fn row_to_trade_log(row: &sqlx::postgres::PgRow) -> Result<TradeLog> {
    Ok(TradeLog {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        bot_id: row.try_get("bot_id")?,
        status: parse_status(&row.try_get::<String, _>("status")?)?,
        pnl: row.try_get::<Option<i64>, _>("pnl_raw")?.map(Decimal8::new),
        recorded_at: row.try_get("recorded_at")?,
    })
}

/// Append-only by convention — never updated or deleted once written.
pub async fn insert_trade_log(pool: &PgPool, entry: &TradeLog) -> Result<()> {
    sqlx::query("insert into trade_logs (id, order_id, bot_id, status, pnl_raw, recorded_at) values ($1, $2, $3, $4, $5, $6)")
        .bind(entry.id)
        .bind(entry.order_id)
        .bind(entry.bot_id)
        .bind(status_str(entry.status))
        .bind(entry.pnl.map(|v| v.raw()))
        .bind(entry.recorded_at)
        .execute(pool)
        .await
        .context("insert_trade_log failed")?;
    Ok(())
}

pub async fn list_trade_logs_for_bot_since(pool: &PgPool, bot_id: Uuid, since: chrono::DateTime<chrono::Utc>) -> Result<Vec<TradeLog>> {
    let rows = sqlx::query("select * from trade_logs where bot_id = $1 and recorded_at >= $2 order by recorded_at asc")
        .bind(bot_id)
        .bind(since)
        .fetch_all(pool)
        .await
        .context("list_trade_logs_for_bot_since failed")?;
    rows.iter().map(row_to_trade_log).collect()
}

/// Instance-wide, not scoped to one bot — backs `performance_report`.
pub async fn list_trade_logs_since(pool: &PgPool, since: chrono::DateTime<chrono::Utc>) -> Result<Vec<TradeLog>> {
    let rows = sqlx::query("select * from trade_logs where recorded_at >= $1 order by recorded_at asc")
        .bind(since)
        .fetch_all(pool)
        .await
        .context("list_trade_logs_since failed")?;
    rows.iter().map(row_to_trade_log).collect()
}
