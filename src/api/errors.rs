use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::UpstreamError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Validation(String),
    ServiceUnavailable(String),
    BadGateway(String),
    GatewayTimeout(String),
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::MissingCredentials { .. } => {
                tracing::warn!(error = %err, "Upstream credential missing");
                ApiError::ServiceUnavailable(err.to_string())
            }
            UpstreamError::Timeout { .. } => {
                tracing::error!(error = %err, "Upstream call timed out");
                ApiError::GatewayTimeout(err.to_string())
            }
            UpstreamError::Api { .. } | UpstreamError::InvalidResponse { .. } => {
                tracing::error!(error = %err, "Upstream call failed");
                ApiError::BadGateway(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ApiError::BadGateway(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::GatewayTimeout(message) => (StatusCode::GATEWAY_TIMEOUT, message),
        };

        (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
    }
}
