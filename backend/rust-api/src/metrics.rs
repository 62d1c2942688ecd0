use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // Business Metrics
    pub static ref LESSONS_COMPLETED_TOTAL: IntCounter = register_int_counter!(
        "lessons_completed_total",
        "Total number of lesson completions recorded"
    )
    .unwrap();

    pub static ref CHAPTER_TESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "chapter_tests_total",
        "Total number of chapter test results recorded",
        &["result"]
    )
    .unwrap();

    pub static ref STREAK_EXTENSIONS_TOTAL: IntCounter = register_int_counter!(
        "streak_extensions_total",
        "Total number of streak initializations and extensions"
    )
    .unwrap();

    pub static ref QUIZZES_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quizzes_generated_total",
        "Total number of quizzes generated",
        &["kind"]
    )
    .unwrap();

    pub static ref QUIZ_ANSWERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_answers_total",
        "Total number of quiz answers scored",
        &["correct"]
    )
    .unwrap();

    // External collaborators
    pub static ref TRANSLATION_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "translation_requests_total",
        "Total number of translation requests proxied",
        &["status"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}
