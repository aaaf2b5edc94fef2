//! Validation and normalization of raw model output.
//!
//! The model reply is an untrusted JSON object. Two fields are hard
//! requirements (non-empty summary, exactly five bullets) and fail the item;
//! everything else degrades to a safe default rather than rejecting an
//! otherwise usable result.

use std::sync::LazyLock;

use briefwire_common::{canonical_tag, BriefwireError, Result, Visibility};
use regex::Regex;
use serde_json::Value;

/// Tags cap after vocabulary matching.
const MAX_TAGS: usize = 8;

// Leading bullet markers models like to prepend: -, *, •, – or "1." / "1)".
static BULLET_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•–]+|\d+[.)])\s*").expect("valid regex"));

/// A model summary that passed validation, ready to persist.
#[derive(Debug, Clone)]
pub struct NormalizedSummary {
    pub title: Option<String>,
    pub summary: String,
    pub bullets: Vec<String>,
    pub why_it_matters: Option<String>,
    pub tags: Vec<String>,
    pub entities: Value,
    pub relevance_score: i32,
    pub visibility: Visibility,
}

/// Validate and normalize a raw model reply.
pub fn normalize(raw: &Value) -> Result<NormalizedSummary> {
    let summary = raw
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if summary.is_empty() {
        return Err(BriefwireError::Validation(
            "model returned an empty summary".to_string(),
        ));
    }

    let bullets = normalize_bullets(raw.get("bullets"))?;

    Ok(NormalizedSummary {
        title: optional_text(raw.get("title")),
        summary: summary.to_string(),
        bullets,
        why_it_matters: optional_text(raw.get("why_it_matters")),
        tags: normalize_tags(raw.get("tags")),
        entities: normalize_entities(raw.get("entities")),
        relevance_score: coerce_score(raw.get("relevance_score")),
        visibility: raw
            .get("visibility")
            .and_then(Value::as_str)
            .map(Visibility::from_str_or_default)
            .unwrap_or(Visibility::Public),
    })
}

/// Bullets must reduce to exactly five non-empty entries once markers are
/// stripped. Anything else is a hard validation failure.
fn normalize_bullets(value: Option<&Value>) -> Result<Vec<String>> {
    let items = value.and_then(Value::as_array).ok_or_else(|| {
        BriefwireError::Validation("model bullets missing or not an array".to_string())
    })?;

    let bullets: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(|b| BULLET_MARKER_RE.replace(b, "").trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();

    if bullets.len() != 5 {
        return Err(BriefwireError::Validation(format!(
            "expected exactly 5 bullets, got {}",
            bullets.len()
        )));
    }
    Ok(bullets)
}

/// Match tags case-insensitively against the closed vocabulary, dropping the
/// rest. Order preserved, duplicates collapsed, capped, defaulting to Other.
fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    if let Some(items) = value.and_then(Value::as_array) {
        for item in items {
            let Some(canonical) = item.as_str().and_then(canonical_tag) else {
                continue;
            };
            if !tags.iter().any(|t| t == canonical) {
                tags.push(canonical.to_string());
            }
            if tags.len() == MAX_TAGS {
                break;
            }
        }
    }
    if tags.is_empty() {
        tags.push("Other".to_string());
    }
    tags
}

/// Entities pass through only as a mapping or sequence; any other shape
/// becomes an empty mapping.
fn normalize_entities(value: Option<&Value>) -> Value {
    match value {
        Some(v) if v.is_object() || v.is_array() => v.clone(),
        _ => serde_json::json!({}),
    }
}

/// Coerce whatever the model put in relevance_score to an integer in
/// [0, 100]. Numbers are truncated, numeric strings parsed, garbage is 0.
fn coerce_score(value: Option<&Value>) -> i32 {
    let score = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    };
    score.clamp(0, 100) as i32
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
