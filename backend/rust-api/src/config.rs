use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub mongo_uri: String,
    pub mongo_database: String,
    /// MyMemory-compatible translation endpoint.
    pub translation_api_url: String,
    /// Base URL of the text-to-speech collaborator.
    pub tts_base_url: String,
    /// Default source language for translation requests.
    pub default_source_lang: String,
    /// Quiz time budget in seconds; expiry forces completion.
    pub quiz_time_limit_seconds: i64,
    /// Optional JSON file with the curriculum catalog. When absent, the
    /// built-in default catalog is used.
    pub curriculum_path: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let listen_addr = settings
            .get_string("server.listen_addr")
            .or_else(|_| env::var("LISTEN_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "lingualearn".to_string());

        let translation_api_url = settings
            .get_string("translation.api_url")
            .or_else(|_| env::var("TRANSLATION_API_URL"))
            .unwrap_or_else(|_| "https://api.mymemory.translated.net/get".to_string());

        let tts_base_url = settings
            .get_string("translation.tts_base_url")
            .or_else(|_| env::var("TTS_BASE_URL"))
            .unwrap_or_else(|_| "https://translate.google.com/translate_tts".to_string());

        let default_source_lang = settings
            .get_string("translation.default_source_lang")
            .or_else(|_| env::var("DEFAULT_SOURCE_LANG"))
            .unwrap_or_else(|_| "fr".to_string());

        let quiz_time_limit_seconds = settings
            .get_int("quiz.time_limit_seconds")
            .ok()
            .or_else(|| {
                env::var("QUIZ_TIME_LIMIT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .filter(|v| *v > 0)
            .unwrap_or(600);

        let curriculum_path = settings
            .get_string("content.curriculum_path")
            .ok()
            .or_else(|| env::var("CURRICULUM_PATH").ok());

        Ok(Config {
            listen_addr,
            mongo_uri,
            mongo_database,
            translation_api_url,
            tts_base_url,
            default_source_lang,
            quiz_time_limit_seconds,
            curriculum_path,
        })
    }
}
