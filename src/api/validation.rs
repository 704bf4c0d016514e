use std::path::Path;

use crate::api::errors::ApiError;
use crate::api::uploads::UploadedFile;

/// Check an uploaded recording against the extension allow-list, and against
/// the declared MIME type when the client sent a specific one. Uploads with no
/// filename or a generic content type pass through; the original service
/// validated field presence only, so unknown metadata is not grounds for
/// rejection.
pub(crate) fn validate_media_upload(
    upload: &UploadedFile,
    allowed_extensions: &[String],
    field_name: &str,
) -> Result<(), ApiError> {
    let Some(filename) = upload.filename.as_deref() else {
        return Ok(());
    };

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let Some(extension) = extension else {
        return Ok(());
    };

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::Validation(format!(
            "'{field_name}' extension '{extension}' is not allowed"
        )));
    }

    let Some(content_type) = upload.content_type.as_deref() else {
        return Ok(());
    };

    let mime = content_type.trim().to_ascii_lowercase();
    if mime.is_empty() || mime == "application/octet-stream" {
        return Ok(());
    }

    if mime_allowed_for_extension(&mime, &extension) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "'{field_name}' MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "webm" => matches!(mime, "audio/webm" | "video/webm"),
        "ogg" => matches!(mime, "audio/ogg" | "application/ogg"),
        "wav" => matches!(mime, "audio/wav" | "audio/x-wav"),
        "flac" => matches!(mime, "audio/flac" | "audio/x-flac"),
        "mp3" => matches!(mime, "audio/mpeg" | "audio/mp3"),
        "m4a" => matches!(mime, "audio/mp4" | "audio/x-m4a"),
        "mp4" => mime == "video/mp4",
        "mov" => mime == "video/quicktime",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(filename: Option<&str>, content_type: Option<&str>) -> UploadedFile {
        UploadedFile {
            filename: filename.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: vec![0u8; 4],
        }
    }

    fn audio_extensions() -> Vec<String> {
        ["webm", "ogg", "wav", "flac", "mp3", "m4a"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accepts_matching_extension_and_mime() {
        let result =
            validate_media_upload(&upload(Some("exam.mp3"), Some("audio/mpeg")), &audio_extensions(), "audio");
        assert!(result.is_ok());
    }

    #[test]
    fn accepts_missing_filename() {
        let result =
            validate_media_upload(&upload(None, Some("audio/webm")), &audio_extensions(), "audio");
        assert!(result.is_ok());
    }

    #[test]
    fn accepts_generic_content_type() {
        let result = validate_media_upload(
            &upload(Some("exam.wav"), Some("application/octet-stream")),
            &audio_extensions(),
            "audio",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_disallowed_extension() {
        let result = validate_media_upload(
            &upload(Some("exam.exe"), Some("audio/mpeg")),
            &audio_extensions(),
            "audio",
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_mismatched_mime() {
        let result = validate_media_upload(
            &upload(Some("exam.mp3"), Some("video/mp4")),
            &audio_extensions(),
            "audio",
        );
        assert!(result.is_err());
    }

    #[test]
    fn uppercase_extension_is_normalized() {
        let result = validate_media_upload(
            &upload(Some("EXAM.WEBM"), Some("audio/webm")),
            &audio_extensions(),
            "audio",
        );
        assert!(result.is_ok());
    }
}
