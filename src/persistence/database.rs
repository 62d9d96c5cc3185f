use crate::core::types::{AuditRecord, CanonicalCardEntity, Recommendation};
use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    pub async fn init(&self) -> Result<()> {
        // Accepted listings resolved to a canonical identity. Multiple rows
        // may share a canonical_sku: each is an independent price observation.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id BIGSERIAL PRIMARY KEY,
                canonical_sku TEXT NOT NULL,
                name_normalized TEXT NOT NULL,
                set_code TEXT NOT NULL,
                card_number TEXT NOT NULL,
                market_tier TEXT NOT NULL,
                filter_quality TEXT NOT NULL,
                resolution_confidence FLOAT NOT NULL,
                source_title TEXT NOT NULL,
                observed_price TEXT, -- Decimal stored as text
                created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Audit trail for every rejected listing.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rejected_listings (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                card_type TEXT NOT NULL,
                exclusion_reason TEXT,
                quality_score FLOAT NOT NULL,
                created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recommendations (
                id BIGSERIAL PRIMARY KEY,
                canonical_sku TEXT NOT NULL,
                action TEXT NOT NULL,
                predicted_return_pct FLOAT NOT NULL,
                confidence FLOAT NOT NULL,
                risk_level TEXT NOT NULL,
                rationale TEXT NOT NULL,
                price_target_low TEXT,
                price_target_high TEXT,
                created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("database schema ready");
        Ok(())
    }

    pub async fn save_entity(&self, entity: &CanonicalCardEntity) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO entities (
                canonical_sku, name_normalized, set_code, card_number,
                market_tier, filter_quality, resolution_confidence,
                source_title, observed_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&entity.canonical_sku)
        .bind(&entity.name_normalized)
        .bind(&entity.set_code)
        .bind(&entity.card_number)
        .bind(entity.market_tier.as_str())
        .bind(entity.filter_quality.as_str())
        .bind(entity.resolution_confidence)
        .bind(&entity.source_title)
        .bind(entity.observed_price.map(|p| p.to_string()))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    pub async fn save_audit(&self, audit: &AuditRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rejected_listings (title, card_type, exclusion_reason, quality_score)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&audit.title)
        .bind(audit.card_type.as_str())
        .bind(audit.exclusion_reason.map(|r| r.as_str()))
        .bind(audit.quality_score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn save_recommendation(&self, rec: &Recommendation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendations (
                canonical_sku, action, predicted_return_pct, confidence,
                risk_level, rationale, price_target_low, price_target_high
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&rec.canonical_sku)
        .bind(rec.action.as_str())
        .bind(rec.predicted_return_pct)
        .bind(rec.confidence)
        .bind(rec.risk_level.as_str())
        .bind(&rec.rationale)
        .bind(rec.price_target_low.map(|p| p.to_string()))
        .bind(rec.price_target_high.map(|p| p.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
