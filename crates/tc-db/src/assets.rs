use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tc_primitives::Decimal8;
use tc_schemas::{Asset, AssetCategory};

fn category_str(c: AssetCategory) -> &'static str {
    match c {
        AssetCategory::Forex => "forex",
        AssetCategory::Crypto => "crypto",
        AssetCategory::Indices => "indices",
        AssetCategory::Commodities => "commodities",
    }
}

fn parse_category(s: &str) -> Result<AssetCategory> {
    match s {
        "forex" => Ok(AssetCategory::Forex),
        "crypto" => Ok(AssetCategory::Crypto),
        "indices" => Ok(AssetCategory::Indices),
        "commodities" => Ok(AssetCategory::Commodities),
        other => anyhow::bail!("unknown asset category: {other}"),
    }
}

fn row_to_asset(row: &sqlx::postgres::PgRow) -> Result<Asset> {
    Ok(Asset {
        symbol: row.try_get("symbol")?,
        category: parse_category(&row.try_get::<String, _>("category")?)?,
        min_qty: Decimal8::new(row.try_get("min_qty_raw")?),
        recommended_qty: Decimal8::new(row.try_get("recommended_qty_raw")?),
        max_spread: Decimal8::new(row.try_get("max_spread_raw")?),
        min_notional: Decimal8::new(row.try_get("min_notional_raw")?),
        is_active: row.try_get("is_active")?,
    })
}

pub async fn upsert_asset(pool: &PgPool, asset: &Asset) -> Result<()> {
    sqlx::query(
        r#"
        insert into assets (symbol, category, min_qty_raw, recommended_qty_raw, max_spread_raw, min_notional_raw, is_active)
        values ($1, $2, $3, $4, $5, $6, $7)
        on conflict (symbol) do update
            set category = excluded.category,
                min_qty_raw = excluded.min_qty_raw,
                recommended_qty_raw = excluded.recommended_qty_raw,
                max_spread_raw = excluded.max_spread_raw,
                min_notional_raw = excluded.min_notional_raw,
                is_active = excluded.is_active
        "#,
    )
    .bind(&asset.symbol)
    .bind(category_str(asset.category))
    .bind(asset.min_qty.raw())
    .bind(asset.recommended_qty.raw())
    .bind(asset.max_spread.raw())
    .bind(asset.min_notional.raw())
    .bind(asset.is_active)
    .execute(pool)
    .await
    .context("upsert_asset failed")?;
    Ok(())
}

pub async fn fetch_asset(pool: &PgPool, symbol: &str) -> Result<Option<Asset>> {
    let row = sqlx::query("select * from assets where symbol = $1").bind(symbol).fetch_optional(pool).await.context("fetch_asset failed")?;
    row.as_ref().map(row_to_asset).transpose()
}

pub async fn list_active_assets(pool: &PgPool) -> Result<Vec<Asset>> {
    let rows = sqlx::query("select * from assets where is_active order by symbol asc").fetch_all(pool).await.context("list_active_assets failed")?;
    rows.iter().map(row_to_asset).collect()
}
