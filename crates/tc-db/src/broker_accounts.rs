use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tc_schemas::BrokerAccount;
use uuid::Uuid;

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<BrokerAccount> {
    Ok(BrokerAccount {
        id: row.try_get("id")?,
        broker_code: row.try_get("broker_code")?,
        credentials: row.try_get("credentials")?,
        is_active: row.try_get("is_active")?,
        is_verified: row.try_get("is_verified")?,
        base_currency: row.try_get("base_currency")?,
        leverage: row.try_get("leverage")?,
    })
}

pub async fn insert_broker_account(pool: &PgPool, account: &BrokerAccount) -> Result<()> {
    sqlx::query(
        r#"
        insert into broker_accounts (id, broker_code, credentials, is_active, is_verified, base_currency, leverage)
        values ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(account.id)
    .bind(&account.broker_code)
    .bind(&account.credentials)
    .bind(account.is_active)
    .bind(account.is_verified)
    .bind(&account.base_currency)
    .bind(account.leverage)
    .execute(pool)
    .await
    .context("insert_broker_account failed")?;
    Ok(())
}

pub async fn fetch_broker_account(pool: &PgPool, id: Uuid) -> Result<Option<BrokerAccount>> {
    let row = sqlx::query("select * from broker_accounts where id = $1").bind(id).fetch_optional(pool).await.context("fetch_broker_account failed")?;
    row.as_ref().map(row_to_account).transpose()
}

/// Set `is_verified`. Called after a successful `check_health`, or cleared
/// when a broker connector reports a configuration error.
pub async fn set_broker_account_verified(pool: &PgPool, id: Uuid, verified: bool) -> Result<()> {
    sqlx::query("update broker_accounts set is_verified = $2 where id = $1").bind(id).bind(verified).execute(pool).await.context("set_broker_account_verified failed")?;
    Ok(())
}

pub async fn list_active_mt5_accounts(pool: &PgPool) -> Result<Vec<BrokerAccount>> {
    let rows = sqlx::query("select * from broker_accounts where is_active and broker_code ilike 'mt5' order by id asc")
        .fetch_all(pool)
        .await
        .context("list_active_mt5_accounts failed")?;
    rows.iter().map(row_to_account).collect()
}
