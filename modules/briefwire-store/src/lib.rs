//! Postgres persistence for briefwire: raw item intake with content-addressed
//! dedup, the atomic claim queue, poll scheduler bookkeeping, and the
//! processed item store.

pub mod claim;
pub mod processed;
pub mod raw_items;
pub mod sources;

pub use claim::{ClaimQueue, MAX_CLAIM_LIMIT};
pub use processed::{NewProcessedItem, ProcessedItemStore};
pub use raw_items::{IngestOutcome, NewRawItem, RawItemStore};
pub use sources::{PollReport, SourcePollScheduler, MAX_SEEN_KEYS};

use briefwire_common::Result;
use sqlx::PgPool;

/// Run the embedded SQL migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| briefwire_common::BriefwireError::Database(e.into()))?;
    Ok(())
}
