use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Backend liveness plus the session's current state. The session fields
/// are null while a question or build is in flight.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend_available = state.provider.health_check().await.unwrap_or(false);

    let (session_state, model, busy) = match state.session.try_lock() {
        Ok(session) => (
            Some(session.state()),
            Some(session.generator().model().to_string()),
            false,
        ),
        Err(_) => (None, None, true),
    };

    Json(json!({
        "provider": state.provider.name(),
        "base_url": state.settings.llm.base_url,
        "backend_available": backend_available,
        "model": model,
        "session_state": session_state,
        "busy": busy,
    }))
}
