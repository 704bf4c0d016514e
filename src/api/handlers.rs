use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::observability;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: state.settings().api().project_name.clone(),
        version: state.settings().api().version.clone(),
    })
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();

    let gemini = state.grading().gemini_configured();
    components.insert("gemini".to_string(), configured_label(gemini));
    if !gemini {
        // Both core endpoints depend on Gemini.
        status = "degraded".to_string();
    }

    components
        .insert("claude".to_string(), configured_label(state.grading().claude_configured()));
    components
        .insert("elevenlabs".to_string(), configured_label(state.speech().is_configured()));

    Json(HealthResponse { service: "viva-api".to_string(), status, components })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match observability::render_metrics() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

fn configured_label(configured: bool) -> String {
    if configured { "configured" } else { "not configured" }.to_string()
}
