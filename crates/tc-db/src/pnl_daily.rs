use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tc_primitives::Decimal8;
use tc_schemas::PnLDaily;
use uuid::Uuid;

fn row_to_pnl_daily(row: &sqlx::postgres::PgRow) -> Result<PnLDaily> {
    Ok(PnLDaily {
        broker_account_id: row.try_get("broker_account_id")?,
        symbol: row.try_get("symbol")?,
        date: row.try_get("date")?,
        realized: Decimal8::new(row.try_get("realized_raw")?),
        unrealized: Decimal8::new(row.try_get("unrealized_raw")?),
        fees: Decimal8::new(row.try_get("fees_raw")?),
        balance: Decimal8::new(row.try_get("balance_raw")?),
    })
}

pub async fn upsert_pnl_daily(pool: &PgPool, row: &PnLDaily) -> Result<()> {
    sqlx::query(
        r#"
        insert into pnl_daily (broker_account_id, symbol, date, realized_raw, unrealized_raw, fees_raw, balance_raw)
        values ($1, $2, $3, $4, $5, $6, $7)
        on conflict (broker_account_id, symbol, date) do update set
          realized_raw = excluded.realized_raw, unrealized_raw = excluded.unrealized_raw,
          fees_raw = excluded.fees_raw, balance_raw = excluded.balance_raw
        "#,
    )
    .bind(row.broker_account_id)
    .bind(&row.symbol)
    .bind(row.date)
    .bind(row.realized.raw())
    .bind(row.unrealized.raw())
    .bind(row.fees.raw())
    .bind(row.balance.raw())
    .execute(pool)
    .await
    .context("upsert_pnl_daily failed")?;
    Ok(())
}

pub async fn fetch_pnl_daily(pool: &PgPool, broker_account_id: Uuid, symbol: &str, date: NaiveDate) -> Result<Option<PnLDaily>> {
    let row = sqlx::query("select * from pnl_daily where broker_account_id = $1 and symbol = $2 and date = $3")
        .bind(broker_account_id)
        .bind(symbol)
        .bind(date)
        .fetch_optional(pool)
        .await
        .context("fetch_pnl_daily failed")?;
    row.as_ref().map(row_to_pnl_daily).transpose()
}

/// Backs `recompute_pnl_from_positions --days N`.
pub async fn list_pnl_daily_for_account_since(pool: &PgPool, broker_account_id: Uuid, since: NaiveDate) -> Result<Vec<PnLDaily>> {
    let rows = sqlx::query("select * from pnl_daily where broker_account_id = $1 and date >= $2 order by date asc, symbol asc")
        .bind(broker_account_id)
        .bind(since)
        .fetch_all(pool)
        .await
        .context("list_pnl_daily_for_account_since failed")?;
    rows.iter().map(row_to_pnl_daily).collect()
}
