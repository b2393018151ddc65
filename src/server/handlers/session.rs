use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::{ApiError, RagError};
use crate::session::{try_acquire, QuickQuestion};
use crate::state::AppState;

const INLINE_SOURCE: &str = "inline";

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub preset: Option<QuickQuestion>,
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let session = try_acquire(&state.session)?;
    Ok(Json(session.snapshot()))
}

/// The extracted text behind the current index.
pub async fn get_document(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let session = try_acquire(&state.session)?;
    let (document, stats) = session
        .document()
        .zip(session.stats())
        .ok_or(RagError::NotIndexed)?;

    Ok(Json(json!({
        "source": document.source(),
        "text": document.text(),
        "stats": stats,
    })))
}

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = try_acquire(&state.session)?;
    let source = payload
        .source
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| INLINE_SOURCE.to_string());

    // runs detached so a dropped connection cannot interrupt the build
    let task = tokio::spawn(async move {
        let stats = session.load_source(payload.text, source).await?;
        Ok::<_, RagError>((stats, session.state()))
    });
    let (stats, session_state) = task.await.map_err(ApiError::internal)??;

    Ok(Json(json!({
        "state": session_state,
        "stats": stats,
    })))
}

pub async fn load_profile(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = try_acquire(&state.session)?;
    let scraper = state.scraper.clone();

    let task = tokio::spawn(async move {
        let text = scraper.fetch(&payload.url).await?;
        let stats = session.load_source(text, payload.url.trim()).await?;
        Ok::<_, RagError>((stats, session.state()))
    });
    let (stats, session_state) = task.await.map_err(ApiError::internal)??;

    Ok(Json(json!({
        "state": session_state,
        "stats": stats,
    })))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = match (payload.question, payload.preset) {
        (Some(question), None) => question,
        (None, Some(preset)) => preset.question().to_string(),
        _ => {
            return Err(ApiError::BadRequest(
                "provide exactly one of `question` or `preset`".to_string(),
            ))
        }
    };

    let mut session = try_acquire(&state.session)?;
    let task = tokio::spawn(async move { session.ask(&question).await });
    let turn = task.await.map_err(ApiError::internal)??;

    Ok(Json(turn))
}

pub async fn quick_questions() -> impl IntoResponse {
    let presets: Vec<_> = QuickQuestion::ALL
        .iter()
        .map(|preset| {
            json!({
                "id": preset,
                "label": preset.label(),
                "question": preset.question(),
            })
        })
        .collect();
    Json(presets)
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = try_acquire(&state.session)?;
    session.clear_history();
    Ok(Json(json!({ "status": "cleared" })))
}
