use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tc_primitives::Decimal8;
use tc_schemas::Execution;
use uuid::Uuid;

fn row_to_execution(row: &sqlx::postgres::PgRow) -> Result<Execution> {
    Ok(Execution {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        qty: Decimal8::new(row.try_get("qty_raw")?),
        price: Decimal8::new(row.try_get("price_raw")?),
        fee: Decimal8::new(row.try_get("fee_raw")?),
        exec_time: row.try_get("exec_time")?,
        account_balance_after: row.try_get::<Option<i64>, _>("account_balance_after_raw")?.map(Decimal8::new),
    })
}

pub async fn insert_execution(pool: &PgPool, execution: &Execution) -> Result<()> {
    sqlx::query(
        r#"
        insert into executions (id, order_id, qty_raw, price_raw, fee_raw, exec_time, account_balance_after_raw)
        values ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(execution.id)
    .bind(execution.order_id)
    .bind(execution.qty.raw())
    .bind(execution.price.raw())
    .bind(execution.fee.raw())
    .bind(execution.exec_time)
    .bind(execution.account_balance_after.map(|v| v.raw()))
    .execute(pool)
    .await
    .context("insert_execution failed")?;
    Ok(())
}

pub async fn list_executions_for_order(pool: &PgPool, order_id: Uuid) -> Result<Vec<Execution>> {
    let rows = sqlx::query("select * from executions where order_id = $1 order by exec_time asc").bind(order_id).fetch_all(pool).await.context("list_executions_for_order failed")?;
    rows.iter().map(row_to_execution).collect()
}

/// One fill in a position's lifetime, carrying just enough of the parent
/// order to replay the weighted-average accounting: which way it traded,
/// and who (`order_id`/`bot_id`) to attribute any recomputed PnL to.
#[derive(Debug, Clone)]
pub struct PositionFill {
    pub order_id: Uuid,
    pub bot_id: Uuid,
    pub side: tc_schemas::OrderSide,
    pub qty: Decimal8,
    pub price: Decimal8,
    pub exec_time: chrono::DateTime<chrono::Utc>,
}

fn parse_side(s: &str) -> Result<tc_schemas::OrderSide> {
    match s {
        "buy" => Ok(tc_schemas::OrderSide::Buy),
        "sell" => Ok(tc_schemas::OrderSide::Sell),
        other => anyhow::bail!("unknown order side: {other}"),
    }
}

/// Every fill ever recorded against `(broker_account_id, symbol)`, oldest
/// first — the full history a weighted-average replay needs, not just the
/// fills inside a lookback window.
pub async fn list_fills_for_account_symbol(pool: &PgPool, broker_account_id: Uuid, symbol: &str) -> Result<Vec<PositionFill>> {
    let rows = sqlx::query(
        r#"
        select e.order_id, o.bot_id, o.side, e.qty_raw, e.price_raw, e.exec_time
        from executions e
        join orders o on o.id = e.order_id
        where o.broker_account_id = $1 and o.symbol = $2
        order by e.exec_time asc, e.id asc
        "#,
    )
    .bind(broker_account_id)
    .bind(symbol)
    .fetch_all(pool)
    .await
    .context("list_fills_for_account_symbol failed")?;

    rows.iter()
        .map(|row| {
            Ok(PositionFill {
                order_id: row.try_get("order_id")?,
                bot_id: row.try_get("bot_id")?,
                side: parse_side(&row.try_get::<String, _>("side")?)?,
                qty: Decimal8::new(row.try_get("qty_raw")?),
                price: Decimal8::new(row.try_get("price_raw")?),
                exec_time: row.try_get("exec_time")?,
            })
        })
        .collect()
}
