use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::uploads::{self, UploadedFile};
use crate::api::validation::validate_media_upload;
use crate::core::state::AppState;
use crate::schemas::{SpeechRequest, TranscriptResponse};

const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// POST /transcribe: produce a text transcript of an exam recording.
pub(crate) async fn transcribe(
    State(state): State<AppState>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let mut multipart = payload
        .map_err(|_| ApiError::Validation("Expected multipart form data".to_string()))?;

    let max_bytes = state.settings().uploads().max_upload_bytes();
    let mut audio: Option<UploadedFile> = None;
    let mut language_code: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Invalid multipart data".to_string()))?
    {
        match field.name().unwrap_or("") {
            "audio" => audio = Some(uploads::collect_file(field, max_bytes, "audio").await?),
            "language_code" => {
                language_code = Some(uploads::collect_text(field, "language_code").await?)
            }
            _ => {}
        }
    }

    let audio =
        audio.ok_or_else(|| ApiError::Validation("'audio' file is required".to_string()))?;
    validate_media_upload(&audio, &state.settings().uploads().allowed_audio_extensions, "audio")?;

    let language_code = language_code.filter(|code| !code.trim().is_empty());
    let transcript = state
        .transcription()
        .transcribe(&audio.bytes, &audio.mime_or(DEFAULT_AUDIO_MIME), language_code.as_deref())
        .await?;

    Ok(Json(TranscriptResponse { success: true, transcript }))
}

/// POST /speech: synthesize MP3 audio for the given text.
pub(crate) async fn speech(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::Validation("Expected a JSON body with 'text'".to_string()))?;

    if request.text.trim().is_empty() {
        return Err(ApiError::Validation("'text' must not be empty".to_string()));
    }

    let audio = state.speech().generate_speech(&request.text).await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}
