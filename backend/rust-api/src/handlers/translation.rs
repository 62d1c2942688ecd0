use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{TranslateRequest, TtsQuery};
use crate::services::AppState;

pub async fn translate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranslateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let response = state.translator.translate(req).await?;
    Ok(Json(response))
}

pub async fn tts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TtsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.text.trim().is_empty() {
        return Err(ApiError::invalid_input("text must not be empty"));
    }

    let response = state.translator.audio_url(&query.text, &query.lang)?;
    Ok(Json(response))
}
