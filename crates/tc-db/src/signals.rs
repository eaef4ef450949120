use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tc_schemas::{Signal, SignalDirection};
use uuid::Uuid;

fn direction_str(d: SignalDirection) -> &'static str {
    match d {
        SignalDirection::Buy => "buy",
        SignalDirection::Sell => "sell",
    }
}

fn parse_direction(s: &str) -> Result<SignalDirection> {
    match s {
        "buy" => Ok(SignalDirection::Buy),
        "sell" => Ok(SignalDirection::Sell),
        other => anyhow::bail!("unknown signal direction: {other}"),
    }
}

fn row_to_signal(row: &sqlx::postgres::PgRow) -> Result<Signal> {
    Ok(Signal {
        id: row.try_get("id")?,
        source: row.try_get("source")?,
        symbol: row.try_get("symbol")?,
        timeframe: row.try_get("timeframe")?,
        direction: parse_direction(&row.try_get::<String, _>("direction")?)?,
        payload: row.try_get("payload")?,
        dedupe_key: row.try_get("dedupe_key")?,
        bot_id: row.try_get("bot_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a signal, deduped on `dedupe_key`. Returns `None` if the key was
/// already present — the caller should treat that as a silently ignored
/// duplicate alert, not an error.
pub async fn insert_signal_deduped(pool: &PgPool, signal: &Signal) -> Result<Option<Signal>> {
    let row = sqlx::query(
        r#"
        insert into signals (id, source, symbol, timeframe, direction, payload, dedupe_key, bot_id, created_at)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        on conflict (dedupe_key) do nothing
        returning *
        "#,
    )
    .bind(signal.id)
    .bind(&signal.source)
    .bind(&signal.symbol)
    .bind(&signal.timeframe)
    .bind(direction_str(signal.direction))
    .bind(&signal.payload)
    .bind(&signal.dedupe_key)
    .bind(signal.created_at)
    .fetch_optional(pool)
    .await
    .context("insert_signal_deduped failed")?;

    row.as_ref().map(row_to_signal).transpose()
}

pub async fn fetch_signal(pool: &PgPool, id: Uuid) -> Result<Option<Signal>> {
    let row = sqlx::query("select * from signals where id = $1").bind(id).fetch_optional(pool).await.context("fetch_signal failed")?;
    row.as_ref().map(row_to_signal).transpose()
}

/// Signals since `since` with no row in `decisions` yet, oldest first —
/// backs the engine's decision cycle, which otherwise has no way to find
/// the inbox of work still waiting on `tc_decision::evaluate_signal`.
pub async fn list_undecided_signals(pool: &PgPool, since: chrono::DateTime<chrono::Utc>) -> Result<Vec<Signal>> {
    let rows = sqlx::query(
        r#"
        select s.*
        from signals s
        left join decisions d on d.signal_id = s.id
        where d.id is null and s.created_at >= $1
        order by s.created_at asc
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .context("list_undecided_signals failed")?;
    rows.iter().map(row_to_signal).collect()
}
