use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use lingualearn_api::services::store::MemoryProgressStore;
use lingualearn_api::{config::Config, create_router, services::AppState};
use std::sync::Arc;
use tower::ServiceExt;

/// Build the full router over an in-memory store, so tests exercise the real
/// HTTP surface without a database.
pub fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        listen_addr: "127.0.0.1:0".to_string(),
        mongo_uri: "mongodb://localhost:27017".to_string(),
        mongo_database: "lingualearn_test".to_string(),
        translation_api_url: "https://api.mymemory.translated.net/get".to_string(),
        tts_base_url: "https://translate.google.com/translate_tts".to_string(),
        default_source_lang: "fr".to_string(),
        quiz_time_limit_seconds: 600,
        curriculum_path: None,
    };

    let store = Arc::new(MemoryProgressStore::default());
    let app_state = Arc::new(AppState::new(config, store).expect("Failed to build test state"));
    create_router(app_state)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
