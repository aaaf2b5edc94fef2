//! Source content retrieval.
//!
//! Both the connection/header phase and the body read get their own 20s
//! budget, so one stalled server costs at most ~40s and shows up as an
//! ordinary per-item failure. Markup responses are reduced to visible text
//! before they reach the model; everything else passes through verbatim.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use briefwire_common::{truncate_to_char_boundary, BriefwireError, Result};
use regex::Regex;
use tracing::debug;

/// Budget for each phase of a fetch (connect/headers, then body read).
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Cap on retained text, bounds the summarizer payload and its cost.
const MAX_CONTENT_BYTES: usize = 40_000;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style>").expect("valid regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Seam between the pipeline and the network. Tests swap in a canned impl.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(FETCH_TIMEOUT)
            .user_agent("briefwire/0.1")
            .build()
            .expect("Failed to build fetch HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| BriefwireError::Fetch(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(BriefwireError::Fetch(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }

        let is_markup = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html") || ct.contains("xml"))
            .unwrap_or(false);

        let body = tokio::time::timeout(FETCH_TIMEOUT, response.text())
            .await
            .map_err(|_| BriefwireError::Fetch(format!("{url}: body read timed out")))?
            .map_err(|e| BriefwireError::Fetch(format!("{url}: {e}")))?;

        let text = if is_markup { strip_markup(&body) } else { body };
        let capped = truncate_to_char_boundary(&text, MAX_CONTENT_BYTES);

        debug!(url, bytes = capped.len(), is_markup, "fetched content");
        Ok(capped.to_string())
    }
}

/// Reduce HTML/XML to visible text: drop script/style bodies, comments, and
/// tags, decode the common entities, collapse whitespace. Deliberately not a
/// real HTML parser — good enough text for a summarizer is the bar.
pub fn strip_markup(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, " ");
    let text = STYLE_RE.replace_all(&text, " ");
    let text = COMMENT_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    WS_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style() {
        let html = r#"<html><head><style>body { color: red }</style>
            <script type="text/javascript">alert("hi");</script></head>
            <body><p>Visible text</p></body></html>"#;
        assert_eq!(strip_markup(html), "Visible text");
    }

    #[test]
    fn strips_comments_and_tags() {
        let html = "<!-- hidden --><div class=\"a\">One</div> <span>Two</span>";
        assert_eq!(strip_markup(html), "One Two");
    }

    #[test]
    fn collapses_whitespace() {
        let html = "<p>One</p>\n\n\n   <p>Two\t\tThree</p>";
        assert_eq!(strip_markup(html), "One Two Three");
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(strip_markup("Ben &amp; Jerry&#39;s"), "Ben & Jerry's");
    }

    #[test]
    fn multiline_script_is_removed() {
        let html = "<script>\nvar x = 1;\nvar y = 2;\n</script>after";
        assert_eq!(strip_markup(html), "after");
    }
}
