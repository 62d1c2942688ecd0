use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// API-level error, shared by all handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    /// Chapter-test gate refusal; lists the vocabulary lessons still open.
    #[error("Chapter test prerequisites not met")]
    PrerequisiteNotMet { missing_lessons: Vec<String> },

    /// A requested generation has nothing to work with (e.g. a chapter with
    /// no vocabulary words).
    #[error("{0}")]
    NoContent(String),

    #[error(transparent)]
    ExternalService(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PrerequisiteNotMet { .. } => StatusCode::CONFLICT,
            ApiError::NoContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = match &self {
            ApiError::PrerequisiteNotMet { missing_lessons } => json!({
                "error": self.to_string(),
                "missing_lessons": missing_lessons,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
