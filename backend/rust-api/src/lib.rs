use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // The API is consumed by the mobile app only; origins stay open.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/v1/languages", get(handlers::curriculum::list_languages))
        .route(
            "/api/v1/languages/{language_id}/curriculum",
            get(handlers::curriculum::get_curriculum),
        )
        .nest(
            "/api/v1/users/{user_id}/languages/{language_id}",
            progress_routes(),
        )
        .nest("/api/v1/quizzes", quiz_routes())
        .route("/api/v1/translate", post(handlers::translation::translate))
        .route("/api/v1/tts", get(handlers::translation::tts))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn progress_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/progress", get(handlers::progress::get_progress))
        .route("/stats", get(handlers::progress::get_stats))
        .route(
            "/lessons/{lesson_id}/complete",
            post(handlers::progress::complete_lesson),
        )
        .route(
            "/chapters/{chapter_id}/test-result",
            post(handlers::progress::record_test_result),
        )
        .route("/streak", post(handlers::progress::update_streak))
}

fn quiz_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", post(handlers::quizzes::create_quiz))
        .route("/{id}", get(handlers::quizzes::get_quiz))
        .route("/{id}/answers", post(handlers::quizzes::submit_answer))
        .route("/{id}/complete", post(handlers::quizzes::complete_quiz))
}
