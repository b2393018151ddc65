use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::llm::discover_models;
use crate::state::AppState;

pub async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let models = discover_models(state.provider.as_ref()).await;
    Json(json!({
        "provider": state.provider.name(),
        "models": models,
    }))
}
