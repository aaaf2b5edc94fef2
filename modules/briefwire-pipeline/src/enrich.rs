//! The enrichment pipeline: claim a batch, then per item fetch -> summarize
//! -> validate -> persist.
//!
//! Items are fully independent: a failure is recorded on its own row and the
//! batch moves on. Only storage failures abort the run, since nothing useful
//! can be recorded without the store.

use std::sync::Arc;

use async_trait::async_trait;
use briefwire_common::{truncate_to_char_boundary, BriefwireError, RawItem, Result};
use briefwire_store::{ClaimQueue, NewProcessedItem, ProcessedItemStore, RawItemStore};
use sqlx::PgPool;
use summarizer_client::{SummarizerClient, SummaryRequest};
use tracing::{info, warn};
use uuid::Uuid;

use crate::fetch::ContentFetcher;
use crate::normalize::normalize;

/// Max stored length of a per-item failure message in the run report.
const REPORT_ERROR_MAX: usize = 500;

/// Seam between the pipeline and the summarization model.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize_content(
        &self,
        content: &str,
        url: &str,
        vertical: &str,
    ) -> Result<serde_json::Value>;

    /// Identifier of the producing model, recorded on each processed item.
    fn model(&self) -> &str;
}

#[async_trait]
impl Summarize for SummarizerClient {
    async fn summarize_content(
        &self,
        content: &str,
        url: &str,
        vertical: &str,
    ) -> Result<serde_json::Value> {
        self.summarize(&SummaryRequest {
            content,
            url,
            vertical,
        })
        .await
        .map_err(|e| BriefwireError::ExternalService(e.to_string()))
    }

    fn model(&self) -> &str {
        SummarizerClient::model(self)
    }
}

/// Outcome of one item in a run.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub raw_item_id: Uuid,
    pub url: String,
    /// None on success; otherwise the error class and truncated message.
    pub error: Option<(String, String)>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.processed()
    }
}

pub struct EnrichmentPipeline {
    claims: ClaimQueue,
    raw_items: RawItemStore,
    processed: ProcessedItemStore,
    fetcher: Arc<dyn ContentFetcher>,
    summarizer: Arc<dyn Summarize>,
}

impl EnrichmentPipeline {
    pub fn new(
        pool: PgPool,
        fetcher: Arc<dyn ContentFetcher>,
        summarizer: Arc<dyn Summarize>,
    ) -> Self {
        Self {
            claims: ClaimQueue::new(pool.clone()),
            raw_items: RawItemStore::new(pool.clone()),
            processed: ProcessedItemStore::new(pool),
            fetcher,
            summarizer,
        }
    }

    /// One claim+enrich cycle. Claims up to `limit` items and processes each
    /// independently; returns per-item outcomes. Safe to invoke concurrently
    /// with other runs — the claim step guarantees disjoint batches.
    pub async fn run(&self, limit: i64) -> Result<RunReport> {
        let items = self.claims.claim(limit).await?;
        info!(claimed = items.len(), "enrichment run starting");

        let mut report = RunReport::default();
        for item in items {
            match self.process_item(&item).await {
                Ok(()) => {
                    info!(id = %item.id, url = %item.url, "item processed");
                    report.outcomes.push(ItemOutcome {
                        raw_item_id: item.id,
                        url: item.url,
                        error: None,
                    });
                }
                // A storage failure is not the item's fault and nothing more
                // can be recorded anyway; surface it and stop the run.
                Err(e @ BriefwireError::Database(_)) => return Err(e),
                Err(e) => {
                    warn!(id = %item.id, url = %item.url, error = %e, "item failed");
                    // Guarded: never downgrades an already-processed row.
                    self.raw_items.mark_error(item.id, &e.to_string()).await?;
                    let message =
                        truncate_to_char_boundary(&e.to_string(), REPORT_ERROR_MAX).to_string();
                    report.outcomes.push(ItemOutcome {
                        raw_item_id: item.id,
                        url: item.url,
                        error: Some((e.kind().to_string(), message)),
                    });
                }
            }
        }

        info!(
            processed = report.processed(),
            failed = report.failed(),
            "enrichment run complete"
        );
        Ok(report)
    }

    async fn process_item(&self, item: &RawItem) -> Result<()> {
        let content = self.fetcher.fetch(&item.url).await?;
        let raw = self
            .summarizer
            .summarize_content(&content, &item.url, &item.vertical)
            .await?;
        let summary = normalize(&raw)?;

        let fresh = self
            .processed
            .insert(NewProcessedItem {
                raw_item_id: item.id,
                vertical: item.vertical(),
                url: item.url.clone(),
                title: summary.title,
                summary: summary.summary,
                bullets: summary.bullets,
                why_it_matters: summary.why_it_matters,
                tags: summary.tags,
                entities: summary.entities,
                relevance_score: summary.relevance_score,
                visibility: summary.visibility,
                model: self.summarizer.model().to_string(),
            })
            .await?;
        if !fresh {
            // A concurrent or retried run got here first; its write stands.
            info!(id = %item.id, "processed item already recorded");
        }

        self.raw_items.mark_processed(item.id).await?;
        Ok(())
    }
}
