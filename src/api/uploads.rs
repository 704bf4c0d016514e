use axum::extract::multipart::Field;

use crate::api::errors::ApiError;

/// A file field collected from a multipart form.
#[derive(Debug, Clone)]
pub(crate) struct UploadedFile {
    pub(crate) filename: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) bytes: Vec<u8>,
}

impl UploadedFile {
    pub(crate) fn mime_or(&self, default: &str) -> String {
        self.content_type.clone().unwrap_or_else(|| default.to_string())
    }
}

/// Drain a file field chunk-wise, enforcing the per-file size cap.
pub(crate) async fn collect_file(
    mut field: Field<'_>,
    max_bytes: u64,
    field_name: &str,
) -> Result<UploadedFile, ApiError> {
    let filename = field.file_name().map(|name| name.to_string());
    let content_type = field.content_type().map(|mime| mime.to_string());

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|_| ApiError::Validation(format!("Failed to read '{field_name}' field")))?
    {
        let next_size = bytes.len() as u64 + chunk.len() as u64;
        if next_size > max_bytes {
            return Err(ApiError::Validation(format!(
                "'{field_name}' exceeds the {}MB upload limit",
                max_bytes / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedFile { filename, content_type, bytes })
}

/// Read a text field, rejecting non-UTF-8 payloads.
pub(crate) async fn collect_text(field: Field<'_>, field_name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::Validation(format!("'{field_name}' must be a text field")))
}
