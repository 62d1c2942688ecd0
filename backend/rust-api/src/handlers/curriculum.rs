use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::curriculum_service::materialize;
use crate::services::progress_service::ProgressService;
use crate::services::AppState;

pub async fn list_languages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.curriculum.list_languages())
}

#[derive(Debug, Deserialize)]
pub struct CurriculumQuery {
    pub user_id: Option<String>,
}

/// The curriculum for one language, annotated with the user's progress when
/// a `user_id` is supplied (a fresh snapshot otherwise).
pub async fn get_curriculum(
    State(state): State<Arc<AppState>>,
    Path(language_id): Path<String>,
    Query(query): Query<CurriculumQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let curriculum = state.curriculum.get(&language_id)?;

    let progress = match &query.user_id {
        Some(user_id) => {
            let service = ProgressService::new(state.store.clone());
            service.get_or_init(user_id, &language_id).await?
        }
        None => {
            let now = chrono::Utc::now();
            crate::models::UserProgress::new("", &language_id, now.date_naive(), now)
        }
    };

    let chapters = materialize(curriculum, &progress);
    Ok(Json(json!({
        "language_id": curriculum.language_id,
        "language_name": curriculum.language_name,
        "chapters": chapters,
    })))
}
