use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::services::anticheat::AnticheatService;
use crate::services::claude::ClaudeClient;
use crate::services::gemini::GeminiClient;
use crate::services::grading::GradingService;
use crate::services::speech::SpeechService;
use crate::services::transcription::TranscriptionService;

const BOUNDARY: &str = "viva-test-boundary";

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("VIVA_ENV", "test");
    std::env::set_var("VIVA_STRICT_CONFIG", "0");
    std::env::set_var("GEMINI_API_KEY", "test-gemini-key");
    std::env::set_var("CLAUDE_API_KEY", "test-claude-key");
    std::env::set_var("ELEVENLABS_API_KEY", "test-elevenlabs-key");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("PROJECT_NAME");
    std::env::remove_var("VERSION");
    std::env::remove_var("MAX_UPLOAD_SIZE_MB");
    std::env::remove_var("ALLOWED_AUDIO_EXTENSIONS");
    std::env::remove_var("ALLOWED_VIDEO_EXTENSIONS");
}

pub(crate) fn test_app() -> Router {
    let settings = Settings::load().expect("settings");

    let gemini = GeminiClient::from_settings(&settings).expect("gemini client");
    let claude = ClaudeClient::from_settings(&settings).expect("claude client");
    let grading = GradingService::new(gemini.clone(), claude, &settings);
    let anticheat = AnticheatService::new(gemini, &settings);
    let transcription = TranscriptionService::from_settings(&settings).expect("transcription");
    let speech = SpeechService::from_settings(&settings).expect("speech");

    let state = AppState::new(settings, grading, anticheat, transcription, speech);
    api::router::router(state)
}

pub(crate) struct TestPart<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
    data: &'a [u8],
}

impl<'a> TestPart<'a> {
    pub(crate) fn text(name: &'a str, value: &'a str) -> Self {
        Self { name, filename: None, content_type: None, data: value.as_bytes() }
    }

    pub(crate) fn file(
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    ) -> Self {
        Self { name, filename: Some(filename), content_type: Some(content_type), data }
    }
}

pub(crate) fn multipart_request(uri: &str, parts: &[TestPart<'_>]) -> Request<Body> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .expect("request body")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
