use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Summarization model
    pub summarizer_api_key: String,
    pub summarizer_model: String,
    pub summarizer_base_url: Option<String>,

    // Worker
    pub claim_batch_size: i64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            summarizer_api_key: required_env("SUMMARIZER_API_KEY"),
            summarizer_model: env::var("SUMMARIZER_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            summarizer_base_url: env::var("SUMMARIZER_BASE_URL").ok(),
            claim_batch_size: env::var("CLAIM_BATCH_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("CLAIM_BATCH_SIZE must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
