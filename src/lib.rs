pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use crate::core::{config::Settings, state::AppState};
use crate::services::anticheat::AnticheatService;
use crate::services::claude::ClaudeClient;
use crate::services::gemini::GeminiClient;
use crate::services::grading::GradingService;
use crate::services::speech::SpeechService;
use crate::services::transcription::TranscriptionService;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    core::observability::init(&settings)?;

    let gemini = GeminiClient::from_settings(&settings)?;
    let claude = ClaudeClient::from_settings(&settings)?;
    let grading = GradingService::new(gemini.clone(), claude, &settings);
    let anticheat = AnticheatService::new(gemini, &settings);
    let transcription = TranscriptionService::from_settings(&settings)?;
    let speech = SpeechService::from_settings(&settings)?;

    let state = AppState::new(settings, grading, anticheat, transcription, speech);
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Viva API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}
