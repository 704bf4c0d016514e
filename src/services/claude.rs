use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::services::UpstreamError;

const SERVICE: &str = "Claude";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub(crate) struct ClaudeClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeClient {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build Claude HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().claude_api_key.clone(),
            base_url: settings.ai().claude_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().claude_model.clone(),
            max_tokens: settings.ai().max_tokens,
        })
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Single-turn text completion through the messages API.
    pub(crate) async fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, UpstreamError> {
        if self.api_key.is_empty() {
            return Err(UpstreamError::MissingCredentials { service: SERVICE });
        }

        let payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system_prompt,
            "temperature": temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        let url = format!("{}/messages", self.base_url);
        let mut last_error = None;
        let mut body = Value::Null;

        for attempt in 0..=MAX_RETRIES {
            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&payload)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    body = resp.json().await.unwrap_or(Value::Null);
                    if status.is_success() {
                        last_error = None;
                        break;
                    }
                    last_error = Some(UpstreamError::Api {
                        service: SERVICE,
                        message: format!("status {status}: {body}"),
                    });
                }
                Err(err) if err.is_timeout() => {
                    last_error = Some(UpstreamError::Timeout { service: SERVICE });
                }
                Err(err) => {
                    last_error =
                        Some(UpstreamError::Api { service: SERVICE, message: err.to_string() });
                }
            }

            if attempt < MAX_RETRIES {
                tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt))).await;
            }
        }

        if let Some(err) = last_error {
            return Err(err);
        }

        extract_message_text(&body).ok_or_else(|| UpstreamError::InvalidResponse {
            service: SERVICE,
            message: "missing message text".to_string(),
        })
    }
}

fn extract_message_text(body: &Value) -> Option<String> {
    let blocks = body.get("content")?.as_array()?;
    let text: String =
        blocks.iter().filter_map(|block| block.get("text").and_then(Value::as_str)).collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_message_text_joins_blocks() {
        let body = serde_json::json!({
            "content": [{"type": "text", "text": "final "}, {"type": "text", "text": "assessment"}]
        });
        assert_eq!(extract_message_text(&body).as_deref(), Some("final assessment"));
    }

    #[test]
    fn extract_message_text_rejects_missing_content() {
        let body = serde_json::json!({"error": {"type": "authentication_error"}});
        assert_eq!(extract_message_text(&body), None);
    }
}
