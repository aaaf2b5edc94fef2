//! Idempotent destination for enrichment results.
//!
//! Uniqueness on raw_item_id is the storage-layer enforcement of "process
//! each raw item at most once", independent of the status guard on the raw
//! row.

use briefwire_common::{ProcessedItem, Result, Vertical, Visibility};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProcessedItemStore {
    pool: PgPool,
}

/// A normalized enrichment result ready to persist.
#[derive(Debug, Clone)]
pub struct NewProcessedItem {
    pub raw_item_id: Uuid,
    pub vertical: Vertical,
    pub url: String,
    pub title: Option<String>,
    pub summary: String,
    pub bullets: Vec<String>,
    pub why_it_matters: Option<String>,
    pub tags: Vec<String>,
    pub entities: serde_json::Value,
    pub relevance_score: i32,
    pub visibility: Visibility,
    pub model: String,
}

impl ProcessedItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a processed record, first successful write wins. Returns false
    /// when a record for this raw item already exists (concurrent or retried
    /// run); the new write is silently discarded.
    pub async fn insert(&self, item: NewProcessedItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_items
                (raw_item_id, vertical, url, title, summary, bullets,
                 why_it_matters, tags, entities, relevance_score, visibility, model)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (raw_item_id) DO NOTHING
            "#,
        )
        .bind(item.raw_item_id)
        .bind(item.vertical.as_str())
        .bind(&item.url)
        .bind(&item.title)
        .bind(&item.summary)
        .bind(serde_json::json!(item.bullets))
        .bind(&item.why_it_matters)
        .bind(serde_json::json!(item.tags))
        .bind(&item.entities)
        .bind(item.relevance_score)
        .bind(item.visibility.as_str())
        .bind(&item.model)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, raw_item_id: Uuid) -> Result<Option<ProcessedItem>> {
        let row = sqlx::query_as::<_, ProcessedItem>(
            "SELECT * FROM processed_items WHERE raw_item_id = $1",
        )
        .bind(raw_item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Undistributed items for the brief collaborator, newest first.
    pub async fn list_unposted(
        &self,
        vertical: Vertical,
        visibility: Visibility,
        limit: i64,
    ) -> Result<Vec<ProcessedItem>> {
        let rows = sqlx::query_as::<_, ProcessedItem>(
            r#"
            SELECT * FROM processed_items
            WHERE vertical = $1 AND visibility = $2 AND posted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(vertical.as_str())
        .bind(visibility.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Stamp items as distributed. Already-posted items keep their original
    /// timestamp.
    pub async fn mark_posted(&self, raw_item_ids: &[Uuid]) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE processed_items
            SET posted_at = now()
            WHERE raw_item_id = ANY($1) AND posted_at IS NULL
            "#,
        )
        .bind(raw_item_ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
