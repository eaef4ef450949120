use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tc_schemas::{Decision, DecisionAction};
use uuid::Uuid;

fn action_str(a: DecisionAction) -> &'static str {
    match a {
        DecisionAction::Open => "open",
        DecisionAction::Close => "close",
        DecisionAction::Ignore => "ignore",
    }
}

fn parse_action(s: &str) -> Result<DecisionAction> {
    match s {
        "open" => Ok(DecisionAction::Open),
        "close" => Ok(DecisionAction::Close),
        "ignore" => Ok(DecisionAction::Ignore),
        other => anyhow::bail!("unknown decision action: {other}"),
    }
}

fn row_to_decision(row: &sqlx::postgres::PgRow) -> Result<Decision> {
    Ok(Decision {
        id: row.try_get("id")?,
        signal_id: row.try_get("signal_id")?,
        bot_id: row.try_get("bot_id")?,
        action: parse_action(&row.try_get::<String, _>("action")?)?,
        reason: row.try_get("reason")?,
        score: row.try_get("score")?,
        params: serde_json::from_value(row.try_get("params")?).context("decode decision params")?,
    })
}

pub async fn insert_decision(pool: &PgPool, decision: &Decision) -> Result<()> {
    sqlx::query(
        r#"
        insert into decisions (id, signal_id, bot_id, action, reason, score, params)
        values ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(decision.id)
    .bind(decision.signal_id)
    .bind(decision.bot_id)
    .bind(action_str(decision.action))
    .bind(&decision.reason)
    .bind(decision.score)
    .bind(serde_json::to_value(&decision.params).context("encode decision params")?)
    .execute(pool)
    .await
    .context("insert_decision failed")?;
    Ok(())
}

pub async fn fetch_decision(pool: &PgPool, id: Uuid) -> Result<Option<Decision>> {
    let row = sqlx::query("select * from decisions where id = $1").bind(id).fetch_optional(pool).await.context("fetch_decision failed")?;
    row.as_ref().map(row_to_decision).transpose()
}
