use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;

use crate::core::config::Settings;
use crate::services::UpstreamError;

const SERVICE: &str = "ElevenLabs";

/// Text-to-speech client producing MP3 audio through the ElevenLabs API.
#[derive(Debug, Clone)]
pub(crate) struct SpeechService {
    client: Client,
    api_key: String,
    base_url: String,
    voice_id: String,
    model_id: String,
}

impl SpeechService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build ElevenLabs HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.tts().api_key.clone(),
            base_url: settings.tts().base_url.trim_end_matches('/').to_string(),
            voice_id: settings.tts().voice_id.clone(),
            model_id: settings.tts().model_id.clone(),
        })
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub(crate) async fn generate_speech(&self, text: &str) -> Result<Vec<u8>, UpstreamError> {
        if self.api_key.is_empty() {
            return Err(UpstreamError::MissingCredentials { service: SERVICE });
        }

        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice_id);
        let payload = json!({
            "text": text,
            "model_id": self.model_id,
        });

        tracing::info!(characters = text.len(), "Generating speech audio");

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    UpstreamError::Timeout { service: SERVICE }
                } else {
                    UpstreamError::Api { service: SERVICE, message: err.to_string() }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                service: SERVICE,
                message: format!("status {status}: {body}"),
            });
        }

        let bytes = response.bytes().await.map_err(|err| UpstreamError::Api {
            service: SERVICE,
            message: format!("failed to read audio body: {err}"),
        })?;

        Ok(bytes.to_vec())
    }
}
