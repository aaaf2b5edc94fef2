use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::prompt::{system_prompt, user_prompt, SummaryRequest};
use crate::types::*;
use crate::util::extract_json_object;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Whole-call budget. Longer than a content fetch: the model has to read the
/// article, not just serve bytes.
const MODEL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SummarizerClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
    tag_vocabulary: Vec<&'static str>,
}

impl SummarizerClient {
    pub fn new(api_key: &str, model: &str, tag_vocabulary: &[&'static str]) -> Self {
        let http = reqwest::Client::builder()
            .timeout(MODEL_TIMEOUT)
            .build()
            .expect("Failed to build summarizer HTTP client");
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            http,
            base_url: OPENAI_API_URL.to_string(),
            tag_vocabulary: tag_vocabulary.to_vec(),
        }
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Summarize one article. Returns the raw JSON object the model produced;
    /// errors on non-success status, timeout, or an unparseable reply.
    pub async fn summarize(&self, req: &SummaryRequest<'_>) -> Result<serde_json::Value> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(&self.tag_vocabulary),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(req),
                },
            ],
            temperature: 0.2,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        debug!(model = %self.model, url = %req.url, "summarizer request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Summarizer API error ({status}): {error_text}"));
        }

        let chat: ChatResponse = response.json().await?;
        let reply = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Empty summarizer response"))?;

        extract_json_object(&reply)
    }
}
