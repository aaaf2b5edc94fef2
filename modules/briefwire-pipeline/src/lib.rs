pub mod enrich;
pub mod fetch;
pub mod normalize;

pub use enrich::{EnrichmentPipeline, ItemOutcome, RunReport, Summarize};
pub use fetch::{strip_markup, ContentFetcher, HttpFetcher};
pub use normalize::{normalize, NormalizedSummary};
