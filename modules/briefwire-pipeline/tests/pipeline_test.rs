//! Integration tests for the enrichment pipeline, with canned fetcher and
//! summarizer implementations.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use briefwire_common::{BriefwireError, Result, Vertical};
use briefwire_pipeline::{ContentFetcher, EnrichmentPipeline, Summarize};
use briefwire_store::{NewRawItem, ProcessedItemStore, RawItemStore};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

/// Pipeline tests all claim from the one shared queue table; serialized so
/// they cannot steal each other's rows.
static CLAIM_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    briefwire_store::migrate(&pool).await.ok()?;
    Some(pool)
}

fn unique_url(tag: &str) -> String {
    format!("https://x.example/{tag}/{}", Uuid::new_v4())
}

// ---------------------------------------------------------------------------
// Canned collaborators
// ---------------------------------------------------------------------------

/// Returns fixed text per url; urls registered as broken fail with Fetch.
struct CannedFetcher {
    broken: Vec<String>,
}

#[async_trait]
impl ContentFetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        if self.broken.iter().any(|b| b == url) {
            return Err(BriefwireError::Fetch(format!("{url}: HTTP 404 Not Found")));
        }
        Ok(format!("article text for {url}"))
    }
}

/// Replies with a per-url canned JSON object, or a valid default.
struct CannedSummarizer {
    replies: Mutex<HashMap<String, Value>>,
}

impl CannedSummarizer {
    fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
        }
    }

    fn set_reply(&self, url: &str, reply: Value) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    fn valid_reply() -> Value {
        json!({
            "title": "A headline",
            "summary": "One good sentence.",
            "bullets": ["one", "two", "three", "four", "five"],
            "why_it_matters": "It matters.",
            "tags": ["Supply"],
            "entities": {"companies": ["Acme"]},
            "relevance_score": 70,
            "visibility": "public"
        })
    }
}

#[async_trait]
impl Summarize for CannedSummarizer {
    async fn summarize_content(&self, _content: &str, url: &str, _vertical: &str) -> Result<Value> {
        Ok(self
            .replies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(Self::valid_reply))
    }

    fn model(&self) -> &str {
        "canned-model"
    }
}

fn pipeline_with(
    pool: PgPool,
    broken: Vec<String>,
    summarizer: Arc<CannedSummarizer>,
) -> EnrichmentPipeline {
    EnrichmentPipeline::new(pool, Arc::new(CannedFetcher { broken }), summarizer)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_failure_then_manual_retry_succeeds() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let _guard = CLAIM_LOCK.lock().await;
    let raw = RawItemStore::new(pool.clone());
    let processed = ProcessedItemStore::new(pool.clone());

    let url = unique_url("scenario");
    let outcome = raw.ingest(NewRawItem::new(Vertical::Ree, &url)).await.unwrap();

    let summarizer = Arc::new(CannedSummarizer::new());
    let mut bad_reply = CannedSummarizer::valid_reply();
    bad_reply["summary"] = json!("");
    summarizer.set_reply(&url, bad_reply);

    let pipeline = pipeline_with(pool.clone(), vec![], summarizer.clone());
    let report = pipeline.run(50).await.unwrap();

    let mine = report
        .outcomes
        .iter()
        .find(|o| o.raw_item_id == outcome.id)
        .expect("item was not claimed");
    assert_eq!(mine.error.as_ref().unwrap().0, "validation");

    let row = raw.get(outcome.id).await.unwrap().unwrap();
    assert_eq!(row.status, "error");
    assert!(row.last_error.is_some());
    assert!(processed.get(outcome.id).await.unwrap().is_none());

    // Operator resets, model behaves this time.
    summarizer.set_reply(&url, CannedSummarizer::valid_reply());
    raw.set_status_new(outcome.id).await.unwrap();

    let report = pipeline.run(50).await.unwrap();
    let mine = report
        .outcomes
        .iter()
        .find(|o| o.raw_item_id == outcome.id)
        .expect("item was not re-claimed after reset");
    assert!(mine.error.is_none());

    let row = raw.get(outcome.id).await.unwrap().unwrap();
    assert_eq!(row.status, "processed");
    assert!(row.last_error.is_none());
    assert!(row.processed_at.is_some());

    let record = processed.get(outcome.id).await.unwrap().unwrap();
    assert_eq!(record.summary, "One good sentence.");
    assert_eq!(record.model, "canned-model");
}

#[tokio::test]
async fn one_bad_item_does_not_stop_the_batch() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let _guard = CLAIM_LOCK.lock().await;
    let raw = RawItemStore::new(pool.clone());

    let bad_url = unique_url("broken");
    let good_url = unique_url("good");
    let bad = raw.ingest(NewRawItem::new(Vertical::Ai, &bad_url)).await.unwrap();
    let good = raw.ingest(NewRawItem::new(Vertical::Ai, &good_url)).await.unwrap();

    let pipeline = pipeline_with(
        pool.clone(),
        vec![bad_url.clone()],
        Arc::new(CannedSummarizer::new()),
    );
    let report = pipeline.run(50).await.unwrap();

    let bad_outcome = report.outcomes.iter().find(|o| o.raw_item_id == bad.id).unwrap();
    assert_eq!(bad_outcome.error.as_ref().unwrap().0, "fetch");
    let good_outcome = report.outcomes.iter().find(|o| o.raw_item_id == good.id).unwrap();
    assert!(good_outcome.error.is_none());

    let row = raw.get(bad.id).await.unwrap().unwrap();
    assert_eq!(row.status, "error");
    assert!(row.last_error.unwrap().contains("404"));
    let row = raw.get(good.id).await.unwrap().unwrap();
    assert_eq!(row.status, "processed");
}

#[tokio::test]
async fn concurrent_runs_process_each_item_exactly_once() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let _guard = CLAIM_LOCK.lock().await;
    let raw = RawItemStore::new(pool.clone());
    let processed = ProcessedItemStore::new(pool.clone());

    let mut ids = Vec::new();
    for i in 0..8 {
        let outcome = raw
            .ingest(NewRawItem::new(Vertical::Ree, unique_url(&format!("conc{i}"))))
            .await
            .unwrap();
        ids.push(outcome.id);
    }

    let a = pipeline_with(pool.clone(), vec![], Arc::new(CannedSummarizer::new()));
    let b = pipeline_with(pool.clone(), vec![], Arc::new(CannedSummarizer::new()));
    let (ra, rb) = tokio::join!(a.run(50), b.run(50));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    // No item appears in both runs.
    for outcome in &ra.outcomes {
        assert!(!rb.outcomes.iter().any(|o| o.raw_item_id == outcome.raw_item_id));
    }

    // Every item ended processed with exactly one processed record.
    for id in ids {
        let row = raw.get(id).await.unwrap().unwrap();
        assert_eq!(row.status, "processed");
        assert!(processed.get(id).await.unwrap().is_some());
    }
}
