use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyzeResponse {
    pub(crate) success: bool,
    pub(crate) grade: i64,
    pub(crate) class_name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheatingResponse {
    pub(crate) success: bool,
    pub(crate) is_cheating: bool,
    pub(crate) confidence: String,
    pub(crate) summary: String,
    pub(crate) indicators_found: Vec<String>,
    pub(crate) recommendation: String,
    pub(crate) notes: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranscriptResponse {
    pub(crate) success: bool,
    pub(crate) transcript: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpeechRequest {
    pub(crate) text: String,
}
