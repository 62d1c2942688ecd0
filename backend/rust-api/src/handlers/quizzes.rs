use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::models::quiz::{CreateQuizRequest, SubmitQuizAnswerRequest};
use crate::services::progress_service::ProgressService;
use crate::services::AppState;

pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let ledger = ProgressService::new(state.store.clone());
    let view = state
        .quizzes
        .create_quiz(req, &state.curriculum, &ledger)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ledger = ProgressService::new(state.store.clone());
    let view = state.quizzes.get_quiz(&quiz_id, &ledger).await?;
    Ok(Json(view))
}

pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<String>,
    Json(req): Json<SubmitQuizAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ledger = ProgressService::new(state.store.clone());
    let response = state.quizzes.submit_answer(&quiz_id, req, &ledger).await?;
    Ok(Json(response))
}

pub async fn complete_quiz(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ledger = ProgressService::new(state.store.clone());
    let summary = state.quizzes.complete_quiz(&quiz_id, &ledger).await?;
    Ok(Json(summary))
}
