//! Postgres persistence. One module per entity, each a set of plain async
//! functions over a shared `PgPool` — there is no repository trait
//! indirection here, because every caller in this workspace already talks
//! to exactly one pool, the same shape the daemon and CLI share.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const ENV_DB_URL: &str = "TC_DATABASE_URL";

pub mod assets;
pub mod bots;
pub mod broker_accounts;
pub mod decisions;
pub mod executions;
pub mod orders;
pub mod pnl_daily;
pub mod positions;
pub mod signals;
pub mod trade_logs;

pub use assets::*;
pub use bots::*;
pub use broker_accounts::*;
pub use decisions::*;
pub use executions::*;
pub use orders::*;
pub use pnl_daily::*;
pub use positions::*;
pub use signals::*;
pub use trade_logs::*;

/// Connect to Postgres using `TC_DATABASE_URL`.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    PgPoolOptions::new().max_connections(10).connect(&url).await.context("failed to connect to Postgres")
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await.context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_bots_table: bool,
}

/// Connectivity + schema presence check, used by `show_runtime_config` and
/// daemon startup.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as("select 1").fetch_one(pool).await.context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as(
        r#"
        select exists (
            select 1 from information_schema.tables
            where table_schema = 'public' and table_name = 'bots'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus { ok: one == 1, has_bots_table: exists })
}
