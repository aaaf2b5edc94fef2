//! Content-addressed intake store for raw items.
//!
//! Ingestion is a single insert-or-merge statement: a duplicate url never
//! creates a second row and never overwrites the first submitter's
//! attribution, but its metadata keys are merged in (incoming wins).

use briefwire_common::{
    truncate_to_char_boundary, url_hash, BriefwireError, RawItem, Result, Vertical,
};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Max stored length of a raw item's last_error, in bytes.
const LAST_ERROR_MAX: usize = 500;

#[derive(Clone)]
pub struct RawItemStore {
    pool: PgPool,
}

/// Parameters for ingesting a candidate item.
#[derive(Debug, Clone)]
pub struct NewRawItem {
    pub vertical: Vertical,
    pub url: String,
    pub source: Option<String>,
    pub source_channel_id: Option<String>,
    pub source_message_id: Option<String>,
    pub author_id: Option<String>,
    pub author_username: Option<String>,
    pub metadata: serde_json::Value,
}

impl NewRawItem {
    pub fn new(vertical: Vertical, url: impl Into<String>) -> Self {
        Self {
            vertical,
            url: url.into(),
            source: None,
            source_channel_id: None,
            source_message_id: None,
            author_id: None,
            author_username: None,
            metadata: serde_json::json!({}),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    pub inserted: bool,
    pub id: Uuid,
}

impl RawItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a candidate item, deduplicating on the url's content address.
    ///
    /// On conflict the existing row wins everything except metadata, which is
    /// merged shallowly with incoming keys taking precedence. Insert and merge
    /// are one statement, so the operation is never partially applied.
    pub async fn ingest(&self, item: NewRawItem) -> Result<IngestOutcome> {
        let hash = url_hash(&item.url);
        // Metadata is an open mapping; anything else degrades to empty.
        let metadata = if item.metadata.is_object() {
            item.metadata
        } else {
            serde_json::json!({})
        };

        let (id, inserted) = sqlx::query_as::<_, (Uuid, bool)>(
            r#"
            INSERT INTO raw_items
                (vertical, url, url_hash, source, source_channel_id,
                 source_message_id, author_id, author_username, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (url_hash) DO UPDATE
                SET metadata = raw_items.metadata || EXCLUDED.metadata
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(item.vertical.as_str())
        .bind(&item.url)
        .bind(&hash)
        .bind(&item.source)
        .bind(&item.source_channel_id)
        .bind(&item.source_message_id)
        .bind(&item.author_id)
        .bind(&item.author_username)
        .bind(&metadata)
        .fetch_one(&self.pool)
        .await?;

        debug!(url = %item.url, %id, inserted, "raw item ingested");
        Ok(IngestOutcome { inserted, id })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<RawItem>> {
        let row = sqlx::query_as::<_, RawItem>("SELECT * FROM raw_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Successful enrichment: stamp processed_at, clear any stale error.
    pub async fn mark_processed(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE raw_items
            SET status = 'processed', last_error = NULL, processed_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a per-item failure. Conditional on the row not already being
    /// processed: a late failure from a superseded concurrent attempt must
    /// not revert a successful outcome.
    pub async fn mark_error(&self, id: Uuid, message: &str) -> Result<()> {
        let message = truncate_to_char_boundary(message, LAST_ERROR_MAX);
        sqlx::query(
            r#"
            UPDATE raw_items
            SET status = 'error', last_error = $2
            WHERE id = $1 AND status <> 'processed'
            "#,
        )
        .bind(id)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Operator reset: error items are not re-claimed automatically, this is
    /// the manual retry path.
    pub async fn set_status_new(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE raw_items SET status = 'new', last_error = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BriefwireError::Validation(format!("unknown raw item: {id}")));
        }
        Ok(())
    }
}
