use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::uploads::{self, UploadedFile};
use crate::api::validation::validate_media_upload;
use crate::core::state::AppState;
use crate::schemas::AnalyzeResponse;

const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// POST /analyze: grade an oral exam recording for the given class.
pub(crate) async fn analyze(
    State(state): State<AppState>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut multipart = payload
        .map_err(|_| ApiError::Validation("Expected multipart form data".to_string()))?;

    let max_bytes = state.settings().uploads().max_upload_bytes();
    let mut audio: Option<UploadedFile> = None;
    let mut class_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Invalid multipart data".to_string()))?
    {
        match field.name().unwrap_or("") {
            "audio" => audio = Some(uploads::collect_file(field, max_bytes, "audio").await?),
            "class_name" => class_name = Some(uploads::collect_text(field, "class_name").await?),
            _ => {}
        }
    }

    let audio =
        audio.ok_or_else(|| ApiError::Validation("'audio' file is required".to_string()))?;
    let class_name = class_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("'class_name' is required".to_string()))?;

    validate_media_upload(&audio, &state.settings().uploads().allowed_audio_extensions, "audio")?;

    let mime_type = audio.mime_or(DEFAULT_AUDIO_MIME);
    let grade = state.grading().process_exam(&audio.bytes, &mime_type, &class_name).await?;

    Ok(Json(AnalyzeResponse { success: true, grade, class_name }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::test_support::{self, TestPart};

    #[tokio::test]
    async fn analyze_without_body_returns_422() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = test_support::test_app();

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/analyze")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn analyze_missing_class_name_returns_422() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = test_support::test_app();

        let request = test_support::multipart_request(
            "/analyze",
            &[TestPart::file("audio", "exam.mp3", "audio/mpeg", b"mock audio content")],
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = test_support::read_json(response).await;
        assert_eq!(json["status"], 422);
        assert!(json["detail"].as_str().expect("detail").contains("class_name"));
    }

    #[tokio::test]
    async fn analyze_missing_audio_returns_422() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = test_support::test_app();

        let request = test_support::multipart_request(
            "/analyze",
            &[TestPart::text("class_name", "Biology 101")],
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = test_support::read_json(response).await;
        assert!(json["detail"].as_str().expect("detail").contains("audio"));
    }

    #[tokio::test]
    async fn analyze_blank_class_name_returns_422() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = test_support::test_app();

        let request = test_support::multipart_request(
            "/analyze",
            &[
                TestPart::file("audio", "exam.webm", "audio/webm", b"mock audio"),
                TestPart::text("class_name", "   "),
            ],
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn analyze_disallowed_extension_returns_422() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let app = test_support::test_app();

        let request = test_support::multipart_request(
            "/analyze",
            &[
                TestPart::file("audio", "exam.exe", "audio/mpeg", b"mock audio"),
                TestPart::text("class_name", "Biology 101"),
            ],
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = test_support::read_json(response).await;
        assert!(json["detail"].as_str().expect("detail").contains("exe"));
    }

    #[tokio::test]
    async fn analyze_oversized_audio_returns_422() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("MAX_UPLOAD_SIZE_MB", "1");
        let app = test_support::test_app();

        let oversized = vec![0u8; 1024 * 1024 + 1];
        let request = test_support::multipart_request(
            "/analyze",
            &[
                TestPart::file("audio", "exam.webm", "audio/webm", &oversized),
                TestPart::text("class_name", "Biology 101"),
            ],
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = test_support::read_json(response).await;
        assert_eq!(json["status"], 422);
        let detail = json["detail"].as_str().expect("detail");
        assert!(detail.contains("audio"));
        assert!(detail.contains("1MB"));
    }

    #[tokio::test]
    async fn analyze_without_credentials_returns_503() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::remove_var("GEMINI_API_KEY");
        let app = test_support::test_app();

        let request = test_support::multipart_request(
            "/analyze",
            &[
                TestPart::file("audio", "exam.webm", "audio/webm", b"mock audio"),
                TestPart::text("class_name", "Biology 101"),
            ],
        );
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
