use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::services::UpstreamError;

const SERVICE: &str = "Speech-to-Text";

/// Client for the Google Speech-to-Text `longrunningrecognize` flow: submit
/// the audio, then poll the returned operation until it completes.
#[derive(Debug, Clone)]
pub(crate) struct TranscriptionService {
    client: Client,
    api_key: String,
    base_url: String,
    default_language_code: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl TranscriptionService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build Speech-to-Text HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().gemini_api_key.clone(),
            base_url: settings.speech().base_url.trim_end_matches('/').to_string(),
            default_language_code: settings.speech().language_code.clone(),
            poll_interval: Duration::from_secs(settings.speech().poll_interval_seconds),
            max_poll_attempts: settings.speech().max_poll_attempts,
        })
    }

    pub(crate) async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
        language_code: Option<&str>,
    ) -> Result<String, UpstreamError> {
        if self.api_key.is_empty() {
            return Err(UpstreamError::MissingCredentials { service: SERVICE });
        }

        let language = language_code.unwrap_or(&self.default_language_code);
        let mut config = speech_config_from_mime_type(mime_type);
        config["languageCode"] = json!(language);

        let payload = json!({
            "config": config,
            "audio": {"content": STANDARD.encode(audio)},
        });

        tracing::info!(audio_bytes = audio.len(), language, "Submitting audio for transcription");

        let start_url =
            format!("{}/speech:longrunningrecognize?key={}", self.base_url, self.api_key);
        let start_response = self.post_json(&start_url, &payload).await?;

        let operation_name = start_response
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| UpstreamError::InvalidResponse {
                service: SERVICE,
                message: "no operation name returned".to_string(),
            })?
            .to_string();

        self.poll_operation(&operation_name).await
    }

    async fn poll_operation(&self, operation_name: &str) -> Result<String, UpstreamError> {
        let poll_url = format!("{}/operations/{}?key={}", self.base_url, operation_name, self.api_key);

        for attempt in 0..self.max_poll_attempts {
            let operation = self.get_json(&poll_url).await?;

            if operation.get("done").and_then(Value::as_bool).unwrap_or(false) {
                if let Some(error) = operation.get("error") {
                    let message = error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown error")
                        .to_string();
                    return Err(UpstreamError::Api { service: SERVICE, message });
                }

                let response = operation.get("response").cloned().unwrap_or(Value::Null);
                let transcript = extract_transcript(&response);
                tracing::info!(characters = transcript.len(), "Transcription completed");
                return Ok(transcript);
            }

            if attempt + 1 >= self.max_poll_attempts {
                break;
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(UpstreamError::Timeout { service: SERVICE })
    }

    async fn post_json(&self, url: &str, payload: &Value) -> Result<Value, UpstreamError> {
        let response = self.client.post(url).json(payload).send().await.map_err(classify)?;
        decode(response).await
    }

    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        let response = self.client.get(url).send().await.map_err(classify)?;
        decode(response).await
    }
}

fn classify(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout { service: SERVICE }
    } else {
        UpstreamError::Api { service: SERVICE, message: err.to_string() }
    }
}

async fn decode(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        return Err(UpstreamError::Api {
            service: SERVICE,
            message: format!("status {status}: {body}"),
        });
    }
    Ok(body)
}

/// Map an upload MIME type onto the recognizer config the API expects.
fn speech_config_from_mime_type(mime_type: &str) -> Value {
    let encoding = match mime_type {
        "audio/ogg" => "OGG_OPUS",
        "audio/flac" => "FLAC",
        "audio/wav" | "audio/x-wav" => "LINEAR16",
        "audio/mp3" | "audio/mpeg" => "MP3",
        _ => "WEBM_OPUS",
    };

    let sample_rate = match mime_type {
        "audio/webm" | "audio/ogg" => Some(48_000),
        "audio/wav" | "audio/x-wav" | "audio/flac" => Some(16_000),
        _ => None,
    };

    let mut config = json!({
        "encoding": encoding,
        "enableAutomaticPunctuation": true,
        "model": "latest_long",
    });
    if let Some(rate) = sample_rate {
        config["sampleRateHertz"] = json!(rate);
    }

    config
}

fn extract_transcript(response: &Value) -> String {
    let Some(results) = response.get("results").and_then(Value::as_array) else {
        return String::new();
    };

    let mut parts = Vec::new();
    for result in results {
        let Some(alternatives) = result.get("alternatives").and_then(Value::as_array) else {
            continue;
        };
        if let Some(transcript) =
            alternatives.first().and_then(|alt| alt.get("transcript")).and_then(Value::as_str)
        {
            let trimmed = transcript.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }

    parts.join(" ")
}
