use thiserror::Error;

/// Result type alias for briefwire operations.
pub type Result<T> = std::result::Result<T, BriefwireError>;

/// Shared error taxonomy. The granularity matters for recovery: `Fetch`,
/// `ExternalService`, and `Validation` are recovered per item during
/// enrichment, while `Database` aborts the whole operation it occurred in.
#[derive(Error, Debug)]
pub enum BriefwireError {
    #[error("Authentication failed")]
    Auth,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Summarizer error: {0}")]
    ExternalService(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BriefwireError {
    /// Short stable label for the error class, used in run reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BriefwireError::Auth => "auth",
            BriefwireError::Validation(_) => "validation",
            BriefwireError::Fetch(_) => "fetch",
            BriefwireError::ExternalService(_) => "external_service",
            BriefwireError::Database(_) => "database",
            BriefwireError::Config(_) => "config",
            BriefwireError::Other(_) => "other",
        }
    }
}
