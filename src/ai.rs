//! Generative-language client and text structuring.
//!
//! Defines the [`TextModel`] trait (prompt in, text out) and its
//! implementations:
//! - **[`DisabledModel`]**: always fails with [`AiError::Configuration`]; used
//!   when the provider is disabled or no API credential is present.
//! - **[`GeminiModel`]**: calls the Gemini `generateContent` REST endpoint
//!   with retry and backoff.
//!
//! On top of a model, [`Structurer`] builds the two prompts this service
//! needs and post-processes the answers:
//! - [`Structurer::analyze_and_structure_text`] turns raw notes into HTML.
//! - [`Structurer::identify_topic`] names the topic of a text, falling back
//!   to a configured label on any failure.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (quota) and 5xx (server error) → retry
//! - Other HTTP 4xx → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AiConfig;
use crate::error::AiError;

/// A remote text-generation function.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Send `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Build the model selected by `config.provider`.
///
/// The API credential is read from the environment variable named by
/// `config.api_key_env` once, here. A missing credential is not fatal: the
/// returned [`DisabledModel`] makes each structuring request fail with a
/// configuration error while the rest of the service keeps working.
pub fn create_model(config: &AiConfig) -> anyhow::Result<Arc<dyn TextModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledModel::new("ai.provider is disabled"))),
        "gemini" => match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Arc::new(GeminiModel::new(config, key)?)),
            _ => {
                tracing::warn!(
                    env = %config.api_key_env,
                    "API key not found in environment; text processing will fail"
                );
                Ok(Arc::new(DisabledModel::new(format!(
                    "{} is not set",
                    config.api_key_env
                ))))
            }
        },
        other => anyhow::bail!("Unknown ai provider: {}", other),
    }
}

// ============ Disabled Model ============

/// A model that refuses every request with [`AiError::Configuration`].
pub struct DisabledModel {
    reason: String,
}

impl DisabledModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextModel for DisabledModel {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
        Err(AiError::Configuration(self.reason.clone()))
    }
}

// ============ Gemini Model ============

/// Google Gemini via `POST {base_url}/v1beta/models/{model}:generateContent`.
///
/// The key travels in the `x-goog-api-key` header. Requests time out after
/// `ai.timeout_secs` and are retried up to `ai.max_retries` times.
pub struct GeminiModel {
    client: reqwest::Client,
    model: String,
    endpoint: String,
    api_key: String,
    max_retries: u32,
}

impl GeminiModel {
    pub fn new(config: &AiConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            model: config.model.clone(),
            endpoint,
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let body = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: Value = response.json().await?;
                        return parse_generate_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = classify_status(status.as_u16(), &body_text);

                    // Quota or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(model = %self.model, attempt, %status, "Gemini request failed, retrying");
                        last_err = Some(err);
                        continue;
                    }

                    return Err(err);
                }
                Err(e) => {
                    tracing::warn!(model = %self.model, attempt, error = %e, "Gemini request failed, retrying");
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AiError::Remote("request failed after retries".to_string())))
    }
}

/// Map a non-success HTTP status and body to an [`AiError`].
pub fn classify_status(status: u16, body: &str) -> AiError {
    let lower = body.to_lowercase();
    let detail = format!("HTTP {}: {}", status, body.trim());

    if status == 429 || lower.contains("resource_exhausted") || lower.contains("quota") {
        AiError::Quota(detail)
    } else if status == 401
        || status == 403
        || lower.contains("api key")
        || lower.contains("api_key_invalid")
    {
        AiError::Auth(detail)
    } else {
        AiError::Remote(detail)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_generate_response(json: &Value) -> Result<String, AiError> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    let parts = match parts {
        Some(parts) => parts,
        None => {
            let reason = json
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(|r| r.as_str());
            return Err(match reason {
                Some(reason) => AiError::Remote(format!("prompt blocked: {}", reason)),
                None => AiError::Remote("invalid response: missing candidates".to_string()),
            });
        }
    };

    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect())
}

// ============ Structuring ============

/// Prompt building and answer cleanup over an injectable [`TextModel`].
pub struct Structurer {
    model: Arc<dyn TextModel>,
    topic_language: String,
    fallback_topic: String,
    topic_input_chars: usize,
}

impl Structurer {
    pub fn new(model: Arc<dyn TextModel>, config: &AiConfig) -> Self {
        Self {
            model,
            topic_language: config.topic_language.clone(),
            fallback_topic: config.fallback_topic.clone(),
            topic_input_chars: config.topic_input_chars,
        }
    }

    pub fn fallback_topic(&self) -> &str {
        &self.fallback_topic
    }

    /// Ask the model to organize `text` into dated, numbered HTML.
    pub async fn analyze_and_structure_text(&self, text: &str) -> Result<String, AiError> {
        let today = chrono::Utc::now().date_naive();
        let prompt = structure_prompt(text, today);

        let raw = self.model.generate(&prompt).await?;
        let html = strip_code_fences(&raw);

        if html.is_empty() {
            return Err(AiError::Remote("model returned an empty answer".to_string()));
        }

        tracing::debug!(model = self.model.name(), input_len = text.len(), output_len = html.len(), "text structured");
        Ok(html)
    }

    /// Name the topic of `text` in one to three words.
    ///
    /// Never fails: any model error or unusable answer yields the configured
    /// fallback label, logged at `warn`.
    pub async fn identify_topic(&self, text: &str) -> String {
        let excerpt = truncate_chars(text, self.topic_input_chars);
        let prompt = topic_prompt(&excerpt, &self.topic_language);

        match self.model.generate(&prompt).await {
            Ok(raw) => {
                let label = clean_topic_label(&raw);
                if label.is_empty() {
                    tracing::warn!(fallback = %self.fallback_topic, "model returned an empty topic, using fallback");
                    self.fallback_topic.clone()
                } else {
                    tracing::info!(topic = %label, "identified topic");
                    label
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, fallback = %self.fallback_topic, "topic identification failed, using fallback");
                self.fallback_topic.clone()
            }
        }
    }
}

pub fn structure_prompt(text: &str, date: NaiveDate) -> String {
    format!(
        r#"Analyze the following text, identify its main ideas and themes, and then organize the text according to these rules:

1. Add a heading with today's date ({date}) for each main section or theme
2. Number the individual points
3. Keep all important information from the original text
4. Return the text as HTML using tags such as <h2>, <ol>, <li>, <p>
5. Where important information needs emphasis, use <strong>
6. Return only the processed HTML without any further comments

Text to analyze:
{text}
"#,
        date = date.format("%Y-%m-%d"),
        text = text
    )
}

pub fn topic_prompt(text: &str, language: &str) -> String {
    format!(
        r#"Analyze the following text and identify its main topic.

Return ONLY the topic name (1-3 words, a noun phrase) without any further comments or explanation.
The topic name must be in {language} and must be short and to the point.

Text to analyze:
{text}
"#,
        language = language,
        text = text
    )
}

/// Remove Markdown code fences the model wraps around its HTML.
pub fn strip_code_fences(raw: &str) -> String {
    let mut s = raw.trim_start();

    if let Some(rest) = s.strip_prefix("```html") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }

    let s = s.trim_end();
    let s = s.strip_suffix("```").unwrap_or(s);

    s.replace("```", "").trim().to_string()
}

/// Reduce a model answer to a short topic label.
///
/// Strips one quote character from each end; answers longer than 30
/// characters or containing a period are cut to their first three words.
pub fn clean_topic_label(raw: &str) -> String {
    let label = raw.trim();
    let label = label.strip_prefix(['"', '\'']).unwrap_or(label);
    let label = label.strip_suffix(['"', '\'']).unwrap_or(label);
    let label = label.trim();

    if label.chars().count() > 30 || label.contains('.') {
        label.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
    } else {
        label.to_string()
    }
}

/// First `max` characters of `text`, with `...` appended when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
