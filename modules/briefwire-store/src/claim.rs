//! Atomic batch leasing of unprocessed raw items.
//!
//! Ownership of an item is established only by the new -> processing
//! transition made here. `FOR UPDATE SKIP LOCKED` keeps concurrent claims
//! disjoint without blocking each other: each call selects only rows no
//! in-flight claim is already examining. The select and the status update
//! are one statement, so a failed claim leaves nothing in `processing`.

use briefwire_common::{RawItem, Result};
use sqlx::PgPool;
use tracing::debug;

/// Ceiling on a single claim batch, bounds batch latency.
pub const MAX_CLAIM_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct ClaimQueue {
    pool: PgPool,
}

impl ClaimQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lease up to `limit` items in FIFO order (oldest created_at first).
    /// Returned items have already transitioned to `processing`.
    pub async fn claim(&self, limit: i64) -> Result<Vec<RawItem>> {
        let limit = limit.clamp(1, MAX_CLAIM_LIMIT);

        let mut rows = sqlx::query_as::<_, RawItem>(
            r#"
            WITH picked AS (
                SELECT id FROM raw_items
                WHERE status = 'new'
                ORDER BY created_at ASC, id ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE raw_items r
            SET status = 'processing'
            FROM picked
            WHERE r.id = picked.id
            RETURNING r.*
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // UPDATE .. RETURNING does not preserve the CTE's order.
        rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        debug!(claimed = rows.len(), limit, "claimed raw items");
        Ok(rows)
    }
}
