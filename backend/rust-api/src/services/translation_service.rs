//! Translation and text-to-speech collaborators.
//!
//! Translation proxies a MyMemory-compatible endpoint; TTS only builds a
//! signed-free audio URL for the client to fetch. Neither call retries:
//! a failed lookup surfaces as a 502 and the client decides.

use crate::config::Config;
use crate::error::ApiError;
use crate::metrics::TRANSLATION_REQUESTS_TOTAL;
use crate::models::{TranslateRequest, TranslateResponse, TtsResponse};
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseStatus")]
    response_status: i64,
    #[serde(rename = "responseData")]
    response_data: MyMemoryData,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// BCP-47 voice tag for a curriculum language id; unknown languages fall
/// back to US English.
pub fn tts_lang(language_id: &str) -> &'static str {
    match language_id {
        "fr" => "fr-FR",
        "en" => "en-US",
        "es" => "es-ES",
        "de" => "de-DE",
        "it" => "it-IT",
        "pt" => "pt-PT",
        _ => "en-US",
    }
}

pub struct TranslationService {
    client: reqwest::Client,
    api_url: String,
    tts_base_url: String,
    default_source_lang: String,
}

impl TranslationService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: config.translation_api_url.clone(),
            tts_base_url: config.tts_base_url.clone(),
            default_source_lang: config.default_source_lang.clone(),
        })
    }

    pub async fn translate(&self, req: TranslateRequest) -> Result<TranslateResponse, ApiError> {
        let source_lang = req
            .source_lang
            .unwrap_or_else(|| self.default_source_lang.clone());
        let langpair = format!("{}|{}", source_lang, req.target_lang);

        let result = self.fetch_translation(&req.text, &langpair).await;
        TRANSLATION_REQUESTS_TOTAL
            .with_label_values(&[if result.is_ok() { "success" } else { "error" }])
            .inc();

        let translation = result?;
        Ok(TranslateResponse {
            translation,
            source_lang,
            target_lang: req.target_lang,
        })
    }

    async fn fetch_translation(&self, text: &str, langpair: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("q", text), ("langpair", langpair)])
            .send()
            .await
            .context("Translation request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::ExternalService(anyhow::anyhow!(
                "Translation service returned {}",
                status
            )));
        }

        let body: MyMemoryResponse = response
            .json()
            .await
            .context("Failed to parse translation response")?;
        if body.response_status != 200 {
            return Err(ApiError::ExternalService(anyhow::anyhow!(
                "Translation lookup failed with status {}",
                body.response_status
            )));
        }

        Ok(body.response_data.translated_text)
    }

    /// Build the audio URL for a word or phrase; the client streams it
    /// directly.
    pub fn audio_url(&self, text: &str, language_id: &str) -> Result<TtsResponse, ApiError> {
        let lang = tts_lang(language_id);
        let url = Url::parse_with_params(
            &self.tts_base_url,
            &[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("q", text),
            ],
        )
        .context("Failed to build TTS URL")?;

        Ok(TtsResponse {
            audio_url: url.into(),
            lang: lang.to_string(),
        })
    }
}
