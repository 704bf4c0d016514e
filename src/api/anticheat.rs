use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::uploads::{self, UploadedFile};
use crate::api::validation::validate_media_upload;
use crate::core::state::AppState;
use crate::schemas::CheatingResponse;

const DEFAULT_AUDIO_MIME: &str = "audio/webm";
const DEFAULT_VIDEO_MIME: &str = "video/webm";

/// POST /detect-cheating: analyze an exam session's audio and video tracks for
/// signs of academic dishonesty.
pub(crate) async fn detect_cheating(
    State(state): State<AppState>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<CheatingResponse>, ApiError> {
    let mut multipart = payload
        .map_err(|_| ApiError::Validation("Expected multipart form data".to_string()))?;

    let max_bytes = state.settings().uploads().max_upload_bytes();
    let mut audio: Option<UploadedFile> = None;
    let mut video: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Invalid multipart data".to_string()))?
    {
        match field.name().unwrap_or("") {
            "audio" => audio = Some(uploads::collect_file(field, max_bytes, "audio").await?),
            "video" => video = Some(uploads::collect_file(field, max_bytes, "video").await?),
            _ => {}
        }
    }

    let audio =
        audio.ok_or_else(|| ApiError::Validation("'audio' file is required".to_string()))?;
    let video =
        video.ok_or_else(|| ApiError::Validation("'video' file is required".to_string()))?;

    validate_media_upload(&audio, &state.settings().uploads().allowed_audio_extensions, "audio")?;
    validate_media_upload(&video, &state.settings().uploads().allowed_video_extensions, "video")?;

    let report = state
        .anticheat()
        .detect_cheating(
            &audio.bytes,
            &audio.mime_or(DEFAULT_AUDIO_MIME),
            &video.bytes,
            &video.mime_or(DEFAULT_VIDEO_MIME),
        )
        .await?;

    Ok(Json(CheatingResponse {
        success: true,
        is_cheating: report.is_cheating,
        confidence: report.confidence,
        summary: report.summary,
        indicators_found: report.indicators_found,
        recommendation: report.recommendation,
        notes: report.notes,
    }))
}
