use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tc_primitives::Decimal8;
use tc_schemas::bot::{AllocationState, PsychologyState};
use tc_schemas::{Bot, BotStatus, EngineMode};
use uuid::Uuid;

fn status_str(s: BotStatus) -> &'static str {
    match s {
        BotStatus::Active => "active",
        BotStatus::Paused => "paused",
        BotStatus::Stopped => "stopped",
    }
}

fn parse_status(s: &str) -> Result<BotStatus> {
    match s {
        "active" => Ok(BotStatus::Active),
        "paused" => Ok(BotStatus::Paused),
        "stopped" => Ok(BotStatus::Stopped),
        other => anyhow::bail!("unknown bot status: {other}"),
    }
}

fn engine_mode_str(m: EngineMode) -> &'static str {
    match m {
        EngineMode::External => "external",
        EngineMode::Harami => "harami",
        EngineMode::Scalper => "scalper",
    }
}

fn parse_engine_mode(s: &str) -> Result<EngineMode> {
    match s {
        "external" => Ok(EngineMode::External),
        "harami" => Ok(EngineMode::Harami),
        "scalper" => Ok(EngineMode::Scalper),
        other => anyhow::bail!("unknown engine mode: {other}"),
    }
}

fn row_to_bot(row: &sqlx::postgres::PgRow) -> Result<Bot> {
    Ok(Bot {
        id: row.try_get("id")?,
        owner: row.try_get("owner")?,
        name: row.try_get("name")?,
        asset_symbol: row.try_get("asset_symbol")?,
        broker_account_id: row.try_get("broker_account_id")?,
        status: parse_status(&row.try_get::<String, _>("status")?)?,
        auto_trade: row.try_get("auto_trade")?,
        engine_mode: parse_engine_mode(&row.try_get::<String, _>("engine_mode")?)?,
        default_timeframe: row.try_get("default_timeframe")?,
        default_qty: Decimal8::new(row.try_get("default_qty_raw")?),
        allowed_timeframes: row.try_get("allowed_timeframes")?,
        enabled_strategies: row.try_get("enabled_strategies")?,
        decision_min_score: row.try_get("decision_min_score")?,
        risk_caps: serde_json::from_value(row.try_get("risk_caps")?).context("decode risk_caps")?,
        trading_window: serde_json::from_value(row.try_get("trading_window")?).context("decode trading_window")?,
        psychology: serde_json::from_value(row.try_get("psychology")?).context("decode psychology")?,
        allocation: serde_json::from_value(row.try_get("allocation")?).context("decode allocation")?,
        scalper_params: row.try_get("scalper_params")?,
        last_htf_bias: row.try_get("last_htf_bias")?,
    })
}

pub async fn upsert_bot(pool: &PgPool, bot: &Bot) -> Result<()> {
    sqlx::query(
        r#"
        insert into bots (
          id, owner, name, asset_symbol, broker_account_id, status, auto_trade, engine_mode,
          default_timeframe, default_qty_raw, allowed_timeframes, enabled_strategies,
          decision_min_score, risk_caps, trading_window, psychology, allocation, scalper_params,
          last_htf_bias
        ) values (
          $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19
        )
        on conflict (id) do update set
          owner = excluded.owner, name = excluded.name, asset_symbol = excluded.asset_symbol,
          broker_account_id = excluded.broker_account_id, status = excluded.status,
          auto_trade = excluded.auto_trade, engine_mode = excluded.engine_mode,
          default_timeframe = excluded.default_timeframe, default_qty_raw = excluded.default_qty_raw,
          allowed_timeframes = excluded.allowed_timeframes, enabled_strategies = excluded.enabled_strategies,
          decision_min_score = excluded.decision_min_score, risk_caps = excluded.risk_caps,
          trading_window = excluded.trading_window, psychology = excluded.psychology,
          allocation = excluded.allocation, scalper_params = excluded.scalper_params,
          last_htf_bias = excluded.last_htf_bias
        "#,
    )
    .bind(bot.id)
    .bind(&bot.owner)
    .bind(&bot.name)
    .bind(&bot.asset_symbol)
    .bind(bot.broker_account_id)
    .bind(status_str(bot.status))
    .bind(bot.auto_trade)
    .bind(engine_mode_str(bot.engine_mode))
    .bind(&bot.default_timeframe)
    .bind(bot.default_qty.raw())
    .bind(&bot.allowed_timeframes)
    .bind(&bot.enabled_strategies)
    .bind(bot.decision_min_score)
    .bind(serde_json::to_value(&bot.risk_caps).context("encode risk_caps")?)
    .bind(serde_json::to_value(&bot.trading_window).context("encode trading_window")?)
    .bind(serde_json::to_value(&bot.psychology).context("encode psychology")?)
    .bind(serde_json::to_value(&bot.allocation).context("encode allocation")?)
    .bind(&bot.scalper_params)
    .bind(&bot.last_htf_bias)
    .execute(pool)
    .await
    .context("upsert_bot failed")?;
    Ok(())
}

pub async fn fetch_bot(pool: &PgPool, id: Uuid) -> Result<Option<Bot>> {
    let row = sqlx::query("select * from bots where id = $1").bind(id).fetch_optional(pool).await.context("fetch_bot failed")?;
    row.as_ref().map(row_to_bot).transpose()
}

pub async fn list_active_bots(pool: &PgPool) -> Result<Vec<Bot>> {
    let rows = sqlx::query("select * from bots where status = 'active' order by owner asc, name asc").fetch_all(pool).await.context("list_active_bots failed")?;
    rows.iter().map(row_to_bot).collect()
}

/// Persist only the psychology/allocation mutations `tc-risk` makes after a
/// realized fill, without a full `upsert_bot` round-trip of static config.
pub async fn save_bot_psychology_and_allocation(pool: &PgPool, bot_id: Uuid, psychology: &PsychologyState, allocation: &AllocationState) -> Result<()> {
    sqlx::query("update bots set psychology = $2, allocation = $3 where id = $1")
        .bind(bot_id)
        .bind(serde_json::to_value(psychology).context("encode psychology")?)
        .bind(serde_json::to_value(allocation).context("encode allocation")?)
        .execute(pool)
        .await
        .context("save_bot_psychology_and_allocation failed")?;
    Ok(())
}

pub async fn save_bot_status(pool: &PgPool, bot_id: Uuid, status: BotStatus) -> Result<()> {
    sqlx::query("update bots set status = $2 where id = $1").bind(bot_id).bind(status_str(status)).execute(pool).await.context("save_bot_status failed")?;
    Ok(())
}

pub async fn save_bot_scalper_params(pool: &PgPool, bot_id: Uuid, scalper_params: &serde_json::Value) -> Result<()> {
    sqlx::query("update bots set scalper_params = $2 where id = $1").bind(bot_id).bind(scalper_params).execute(pool).await.context("save_bot_scalper_params failed")?;
    Ok(())
}

