//! Google Translate API v2 provider
//!
//! The API key is read from `GOOGLE_TRANSLATE_API_KEY`. Without it the
//! provider cannot be built, which the binary reports as a missing
//! dependency before any request is made.

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{MachineTranslator, normalize_locale, validate_locale};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "GOOGLE_TRANSLATE_API_KEY";

/// Google Translate API v2 provider
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateProvider {
    /// The v2 endpoint accepts at most 128 `q` entries per request
    const MAX_REQUEST_TEXTS: usize = 128;

    /// Per-string limit of the v2 endpoint
    const MAX_CHARS_PER_STRING: usize = 30_000;

    /// Create a provider with an explicit API key
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: "https://translation.googleapis.com/language/translate/v2".to_string(),
        })
    }

    /// Create a provider from the `GOOGLE_TRANSLATE_API_KEY` environment variable
    ///
    /// An unset variable is a [`MtError::MissingCapability`]: the run cannot
    /// translate anything and should stop before touching the network.
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| {
            MtError::MissingCapability(format!("{} environment variable not set", API_KEY_VAR))
        })?;

        Self::new(api_key)
    }

    /// Point the provider at a different endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn check_length(index: usize, text: &str) -> MtResult<()> {
        if text.chars().count() > Self::MAX_CHARS_PER_STRING {
            return Err(MtError::TranslationError(format!(
                "Text at index {} exceeds maximum length of {} characters",
                index,
                Self::MAX_CHARS_PER_STRING
            )));
        }
        Ok(())
    }

    /// Send one request to the API
    async fn translate_request(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        let url = format!("{}?key={}", self.base_url, self.api_key);

        let body = json!({
            "q": texts,
            "source": normalize_locale(source_locale),
            "target": normalize_locale(target_locale),
            "format": "text"
        });

        debug!(
            texts = texts.len(),
            source = source_locale,
            target = target_locale,
            "sending translate request"
        );

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(if status.is_client_error() {
                MtError::TranslationError(format!("API client error ({}): {}", status, error_text))
            } else {
                MtError::NetworkError(format!("API server error ({}): {}", status, error_text))
            });
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            MtError::TranslationError(format!("Failed to parse API response: {}", e))
        })?;

        let translations = json["data"]["translations"].as_array().ok_or_else(|| {
            MtError::TranslationError(
                "Invalid API response: missing 'data.translations' array".to_string(),
            )
        })?;

        translations
            .iter()
            .map(|t| {
                t["translatedText"]
                    .as_str()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        MtError::TranslationError(
                            "Invalid API response: missing 'translatedText' field".to_string(),
                        )
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if text.is_empty() {
            return Ok(String::new());
        }
        Self::check_length(0, text)?;

        let results = self
            .translate_request(&[text.to_string()], source_locale, target_locale)
            .await?;

        if results.len() != 1 {
            return Err(MtError::BatchShapeMismatch {
                expected: 1,
                actual: results.len(),
            });
        }

        Ok(results.into_iter().next().unwrap_or_default())
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        for (i, text) in texts.iter().enumerate() {
            Self::check_length(i, text)?;
        }

        let mut all_results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(Self::MAX_REQUEST_TEXTS) {
            let chunk_results = self
                .translate_request(chunk, source_locale, target_locale)
                .await?;
            all_results.extend(chunk_results);
        }

        if all_results.len() != texts.len() {
            return Err(MtError::BatchShapeMismatch {
                expected: texts.len(),
                actual: all_results.len(),
            });
        }

        Ok(all_results)
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
