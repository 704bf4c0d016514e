use thiserror::Error;

pub(crate) mod anticheat;
pub(crate) mod claude;
pub(crate) mod gemini;
pub(crate) mod grading;
pub(crate) mod speech;
pub(crate) mod transcription;

/// Failure classification shared by all outbound model/API clients.
#[derive(Debug, Error)]
pub(crate) enum UpstreamError {
    #[error("{service} API key is not configured")]
    MissingCredentials { service: &'static str },
    #[error("{service} request timed out")]
    Timeout { service: &'static str },
    #[error("{service} API error: {message}")]
    Api { service: &'static str, message: String },
    #[error("{service} returned an unusable response: {message}")]
    InvalidResponse { service: &'static str, message: String },
}
