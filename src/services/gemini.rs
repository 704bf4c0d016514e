use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::services::UpstreamError;

const SERVICE: &str = "Gemini";
const MAX_RETRIES: u32 = 3;

/// One part of a Gemini `contents` entry, either text or inline media.
#[derive(Debug, Clone)]
pub(crate) enum GeminiPart {
    Text(String),
    Media { mime_type: String, data: Vec<u8> },
}

#[derive(Debug, Clone)]
pub(crate) struct GeminiRequest {
    pub(crate) model: String,
    pub(crate) system_instruction: String,
    pub(crate) parts: Vec<GeminiPart>,
    pub(crate) temperature: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl GeminiClient {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().gemini_api_key.clone(),
            base_url: settings.ai().gemini_base_url.trim_end_matches('/').to_string(),
            max_tokens: settings.ai().max_tokens,
        })
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Issue a `generateContent` call and return the joined text of the first candidate.
    pub(crate) async fn generate(&self, request: &GeminiRequest) -> Result<String, UpstreamError> {
        if self.api_key.is_empty() {
            return Err(UpstreamError::MissingCredentials { service: SERVICE });
        }

        let parts: Vec<Value> = request
            .parts
            .iter()
            .map(|part| match part {
                GeminiPart::Text(text) => json!({"text": text}),
                GeminiPart::Media { mime_type, data } => json!({
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": STANDARD.encode(data),
                    }
                }),
            })
            .collect();

        let payload = json!({
            "systemInstruction": {"parts": [{"text": request.system_instruction}]},
            "contents": [{"role": "user", "parts": parts}],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": self.max_tokens,
            }
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let mut last_error = None;
        let mut body = Value::Null;

        for attempt in 0..=MAX_RETRIES {
            let response = self.client.post(&url).json(&payload).send().await;

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

        extract_candidate_text(&body).ok_or_else(|| UpstreamError::InvalidResponse {
            service: SERVICE,
            message: "missing candidate text".to_string(),
        })
    }
}

fn extract_candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String =
        parts.iter().filter_map(|part| part.get("text").and_then(Value::as_str)).collect();

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
    fn extract_candidate_text_joins_parts() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "world"}]}
            }]
        });
        assert_eq!(extract_candidate_text(&body).as_deref(), Some("Hello world"));
    }

    #[test]
    fn extract_candidate_text_rejects_empty() {
        let body = serde_json::json!({"candidates": [{"content": {"parts": []}}]});
        assert_eq!(extract_candidate_text(&body), None);

        let body = serde_json::json!({"error": {"message": "quota"}});
        assert_eq!(extract_candidate_text(&body), None);
    }
}
