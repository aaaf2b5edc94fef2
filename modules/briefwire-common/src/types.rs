use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Closed vocabularies ---

/// Content domain partition. Unrecognized input falls back to `General`
/// rather than rejecting the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Ree,
    Ai,
    Energy,
    General,
}

impl Vertical {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vertical::Ree => "ree",
            Vertical::Ai => "ai",
            Vertical::Energy => "energy",
            Vertical::General => "general",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ree" => Vertical::Ree,
            "ai" => Vertical::Ai,
            "energy" => Vertical::Energy,
            _ => Vertical::General,
        }
    }
}

/// Raw item lifecycle. `Processed` is terminal — a late failure from a
/// superseded attempt must never downgrade it back to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    New,
    Processing,
    Processed,
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::New => "new",
            ItemStatus::Processing => "processing",
            ItemStatus::Processed => "processed",
            ItemStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Pro,
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Pro => "pro",
            Visibility::Internal => "internal",
        }
    }

    /// Invalid or absent visibility defaults to `Public`.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pro" => Visibility::Pro,
            "internal" => Visibility::Internal,
            "public" => Visibility::Public,
            _ => Visibility::Public,
        }
    }
}

/// Closed tag vocabulary for processed items. Model output is matched
/// case-insensitively against this list; anything else is dropped.
pub const TAG_VOCABULARY: &[&str] = &[
    "Deals",
    "Policy",
    "Supply",
    "Tech",
    "Markets",
    "Research",
    "Companies",
    "People",
    "Risk",
    "Other",
];

/// Canonical-case vocabulary entry for a candidate tag, if it matches.
pub fn canonical_tag(candidate: &str) -> Option<&'static str> {
    let lowered = candidate.trim().to_lowercase();
    TAG_VOCABULARY
        .iter()
        .find(|t| t.to_lowercase() == lowered)
        .copied()
}

// --- Rows ---

/// A submitted candidate content reference awaiting enrichment.
/// `vertical` and `status` are stored as TEXT; use the typed accessors.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawItem {
    pub id: Uuid,
    pub vertical: String,
    pub url: String,
    pub url_hash: String,
    pub source: Option<String>,
    pub source_channel_id: Option<String>,
    pub source_message_id: Option<String>,
    pub author_id: Option<String>,
    pub author_username: Option<String>,
    pub metadata: serde_json::Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl RawItem {
    pub fn vertical(&self) -> Vertical {
        Vertical::from_str_or_default(&self.vertical)
    }
}

/// The normalized, model-enriched record derived from exactly one raw item.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessedItem {
    pub raw_item_id: Uuid,
    pub vertical: String,
    pub url: String,
    pub title: Option<String>,
    pub summary: String,
    pub bullets: serde_json::Value,
    pub why_it_matters: Option<String>,
    pub tags: serde_json::Value,
    pub entities: serde_json::Value,
    pub relevance_score: i32,
    pub visibility: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// A configured poll target (RSS feed or similar). Rows are created by
/// operators; the poll scheduler only mutates the bookkeeping columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Source {
    pub id: Uuid,
    pub vertical: String,
    pub kind: String,
    pub name: String,
    pub url: String,
    pub poll_interval_min: i32,
    pub enabled: bool,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}
