//! Client for the external summarization model.
//!
//! Speaks OpenAI-style chat completions. The model is asked for a single
//! JSON object (title, one-sentence summary, five bullets, why-it-matters,
//! tags, entities, relevance score, visibility); this crate only guarantees
//! a parseable JSON object comes back — shape validation is the pipeline's
//! job.

mod client;
mod prompt;
mod types;
mod util;

pub use client::SummarizerClient;
pub use prompt::{system_prompt, SummaryRequest};
pub use util::extract_json_object;
