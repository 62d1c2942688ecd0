use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::models::curriculum::LessonKind;
use crate::models::{ChapterTestResultRequest, CompleteLessonRequest};
use crate::services::curriculum_service::ensure_test_available;
use crate::services::progress_service::ProgressService;
use crate::services::AppState;

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, language_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state.curriculum.get(&language_id)?;

    let service = ProgressService::new(state.store.clone());
    let progress = service.get_or_init(&user_id, &language_id).await?;
    Ok(Json(progress))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path((user_id, language_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state.curriculum.get(&language_id)?;

    let service = ProgressService::new(state.store.clone());
    let stats = service.get_stats(&user_id, &language_id).await?;
    Ok(Json(stats))
}

pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Path((user_id, language_id, lesson_id)): Path<(String, String, String)>,
    Json(req): Json<CompleteLessonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let (_, lesson) = state.curriculum.lesson(&language_id, &lesson_id)?;
    if lesson.kind != LessonKind::Vocabulary {
        return Err(ApiError::invalid_input(
            "Chapter tests are reported through the test-result endpoint",
        ));
    }
    let base_xp = req.base_xp.unwrap_or(lesson.xp);

    let service = ProgressService::new(state.store.clone());
    let response = service
        .record_lesson_completion(&user_id, &language_id, &lesson_id, req.score, base_xp)
        .await?;
    Ok(Json(response))
}

pub async fn record_test_result(
    State(state): State<Arc<AppState>>,
    Path((user_id, language_id, chapter_id)): Path<(String, String, u32)>,
    Json(req): Json<ChapterTestResultRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let service = ProgressService::new(state.store.clone());
    let chapter = state.curriculum.chapter(&language_id, chapter_id)?;
    let progress = service.get_or_init(&user_id, &language_id).await?;
    ensure_test_available(chapter, &progress)?;

    let outcome = service
        .record_chapter_test_result(
            &user_id,
            &language_id,
            chapter_id,
            req.points_earned,
            req.points_possible,
        )
        .await?;
    Ok(Json(outcome))
}

pub async fn update_streak(
    State(state): State<Arc<AppState>>,
    Path((user_id, language_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state.curriculum.get(&language_id)?;

    let service = ProgressService::new(state.store.clone());
    let outcome = service.update_streak(&user_id, &language_id).await?;
    Ok(Json(outcome))
}
