//! Poll scheduler bookkeeping: which sources are due, and what each poll saw.
//!
//! The external crawler drives this from outside: it asks for due sources,
//! fetches them, and reports back conditional-fetch metadata plus the item
//! keys it observed. A report is one transaction — a recorded poll timestamp
//! with lost seen-keys would make the crawler silently skip entries forever.

use briefwire_common::{BriefwireError, Result, Source};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Cap on seen keys per report/lookup call.
pub const MAX_SEEN_KEYS: usize = 200;

#[derive(Clone)]
pub struct SourcePollScheduler {
    pool: PgPool,
}

/// Outcome of one poll of a source, as reported by the crawler.
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_error: Option<String>,
    pub seen_keys: Vec<String>,
}

impl SourcePollScheduler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enabled sources of `kind` whose poll interval has elapsed.
    ///
    /// Never-polled sources sort first, then ascending last_polled_at with id
    /// as tiebreak — fair rotation, so a short-interval source cannot starve
    /// the rest and new sources are serviced promptly.
    pub async fn due_sources(&self, kind: &str, limit: i64) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, Source>(
            r#"
            SELECT * FROM sources
            WHERE enabled
              AND kind = $1
              AND (last_polled_at IS NULL
                   OR last_polled_at <= now() - (poll_interval_min * interval '1 minute'))
            ORDER BY last_polled_at ASC NULLS FIRST, id ASC
            LIMIT $2
            "#,
        )
        .bind(kind)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Record a completed poll: bookkeeping update plus seen-key inserts in
    /// one transaction. Returns the count of newly recorded keys (keys
    /// already in the seen-set are ignored, not an error).
    pub async fn report(&self, source_id: Uuid, report: PollReport) -> Result<u64> {
        if report.seen_keys.len() > MAX_SEEN_KEYS {
            return Err(BriefwireError::Validation(format!(
                "too many seen keys: {} (max {MAX_SEEN_KEYS})",
                report.seen_keys.len()
            )));
        }

        let mut tx = self.pool.begin().await?;

        // etag/last_modified are only replaced when the crawler got fresh
        // ones; a conditional 304 reports neither and must not clear them.
        // last_error is always set as given, so a clean poll clears it.
        let updated = sqlx::query(
            r#"
            UPDATE sources
            SET last_polled_at = now(),
                etag = COALESCE($2, etag),
                last_modified = COALESCE($3, last_modified),
                last_error = $4
            WHERE id = $1
            "#,
        )
        .bind(source_id)
        .bind(&report.etag)
        .bind(&report.last_modified)
        .bind(&report.last_error)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Transaction drops here, nothing is recorded.
            return Err(BriefwireError::Validation(format!(
                "unknown source: {source_id}"
            )));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO source_seen_keys (source_id, item_key)
            SELECT $1, k FROM unnest($2::text[]) AS t(k)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(source_id)
        .bind(&report.seen_keys)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        debug!(%source_id, new_keys = inserted, "poll reported");
        Ok(inserted)
    }

    /// Subset of `keys` already recorded as seen for this source. Pure read,
    /// used by the crawler to skip re-submitting unchanged feed entries.
    pub async fn lookup_seen(&self, source_id: Uuid, keys: &[String]) -> Result<Vec<String>> {
        if keys.len() > MAX_SEEN_KEYS {
            return Err(BriefwireError::Validation(format!(
                "too many keys: {} (max {MAX_SEEN_KEYS})",
                keys.len()
            )));
        }

        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT item_key FROM source_seen_keys
            WHERE source_id = $1 AND item_key = ANY($2)
            "#,
        )
        .bind(source_id)
        .bind(keys)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(k,)| k).collect())
    }
}
