use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures of the retrieval-augmented conversation pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RagError {
    #[error("no usable content: {0}")]
    SourceUnavailable(String),
    #[error("embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("language model backend unreachable: {0}")]
    BackendUnreachable(String),
    #[error("language model backend timed out after {0}s")]
    BackendTimeout(u64),
    #[error("turn {0} has already been answered")]
    AlreadyAnswered(u64),
    #[error("unknown turn {0}")]
    UnknownTurn(u64),
    #[error("a question is still being answered")]
    SessionBusy,
    #[error("no document has been indexed yet")]
    NotIndexed,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        let message = err.to_string();
        match err {
            RagError::SourceUnavailable(_) | RagError::InvalidInput(_) => {
                ApiError::BadRequest(message)
            }
            RagError::NotIndexed | RagError::SessionBusy => ApiError::Conflict(message),
            RagError::BackendUnreachable(_) | RagError::EmbeddingUnavailable(_) => {
                ApiError::ServiceUnavailable(message)
            }
            RagError::BackendTimeout(_) => ApiError::GatewayTimeout(message),
            RagError::UnknownTurn(_) => ApiError::NotFound(message),
            RagError::AlreadyAnswered(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
