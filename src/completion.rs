//! Language-model completion backends used by `ask`.
//!
//! Defines the [`CompletionBackend`] trait and the [`OpenAiBackend`]
//! implementation, which calls the OpenAI Responses API.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Once retries are exhausted the last error is returned and the `ask`
//! invocation fails.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::CompletionConfig;

/// Sampling options for one completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 600,
        }
    }
}

impl From<&CompletionConfig> for CompletionOptions {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// A text completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider name recorded with answers (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str, opts: &CompletionOptions) -> Result<String>;
}

/// Build the backend selected by `[completion]`, or `None` when disabled.
pub fn create_backend(config: &CompletionConfig) -> Result<Option<Box<dyn CompletionBackend>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "openai" => Ok(Some(Box::new(OpenAiBackend::new(config)?))),
        other => bail!("Unknown completion provider: {}", other),
    }
}

// ============ OpenAI Backend ============

/// Completion backend using `POST {base_url}/responses`.
///
/// Requires the `OPENAI_API_KEY` environment variable unless constructed
/// with [`OpenAiBackend::with_api_key`].
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
}

impl OpenAiBackend {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &CompletionConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str, opts: &CompletionOptions) -> Result<String> {
        let url = format!("{}/responses", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": prompt,
            "temperature": opts.temperature,
            "max_output_tokens": opts.max_output_tokens,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::warn!(attempt, ?delay, "retrying completion request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "OpenAI API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Completion failed after retries")))
    }
}

/// Concatenate every `output[].content[].text` part of a Responses API reply.
fn parse_response(json: &serde_json::Value) -> Result<String> {
    let output = json
        .get("output")
        .and_then(|o| o.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing output array"))?;

    let text: String = output
        .iter()
        .filter_map(|item| item.get("content").and_then(|c| c.as_array()))
        .flatten()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_joins_text_parts() {
        let json = serde_json::json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Hello "},
                    {"type": "output_text", "text": "there."}
                ]}
            ]
        });
        assert_eq!(parse_response(&json).unwrap(), "Hello there.");
    }

    #[test]
    fn test_parse_rejects_missing_output() {
        assert!(parse_response(&serde_json::json!({"error": "x"})).is_err());
    }

    #[test]
    fn test_disabled_provider_has_no_backend() {
        let config = CompletionConfig::default();
        assert!(create_backend(&config).unwrap().is_none());
    }

    #[test]
    fn test_options_follow_config() {
        let config = CompletionConfig {
            temperature: 0.7,
            max_output_tokens: 42,
            ..Default::default()
        };
        let opts = CompletionOptions::from(&config);
        assert_eq!(opts.temperature, 0.7);
        assert_eq!(opts.max_output_tokens, 42);
    }
}
