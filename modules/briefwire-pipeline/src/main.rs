//! briefwire-worker: one claim+enrich cycle, invoked by cron or by hand.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use briefwire_common::{Config, TAG_VOCABULARY};
use briefwire_pipeline::{EnrichmentPipeline, HttpFetcher};
use summarizer_client::SummarizerClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("briefwire=info".parse()?))
        .init();

    info!("briefwire worker starting");

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url).await?;
    briefwire_store::migrate(&pool).await?;

    let mut summarizer = SummarizerClient::new(
        &config.summarizer_api_key,
        &config.summarizer_model,
        TAG_VOCABULARY,
    );
    if let Some(base_url) = &config.summarizer_base_url {
        summarizer = summarizer.with_base_url(base_url);
    }

    let pipeline = EnrichmentPipeline::new(
        pool,
        Arc::new(HttpFetcher::new()),
        Arc::new(summarizer),
    );

    let report = pipeline.run(config.claim_batch_size).await?;

    for outcome in &report.outcomes {
        if let Some((kind, message)) = &outcome.error {
            warn!(id = %outcome.raw_item_id, url = %outcome.url, kind, message, "item failed");
        }
    }
    info!(
        processed = report.processed(),
        failed = report.failed(),
        "worker run complete"
    );

    Ok(())
}
