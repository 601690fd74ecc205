use async_trait::async_trait;
use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::TranslationError;
use super::{http_client, status_error, Translator};

/// LibreTranslate client
#[derive(Debug)]
pub struct LibreTranslate {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the instance
    endpoint: String,
    /// API key, empty for instances that don't need one
    api_key: String,
}

/// `/translate` request body
#[derive(Debug, Serialize)]
pub struct LibreTranslateRequest<'a> {
    /// Text to translate
    q: &'a str,
    /// Source language or `auto`
    source: &'a str,
    /// Target language
    target: &'a str,
    /// Always plain text
    format: &'static str,
    /// API key if configured
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

/// `/translate` response body, success or error
#[derive(Debug, Deserialize)]
pub struct LibreTranslateResponse {
    /// The translated text
    #[serde(rename = "translatedText")]
    pub translated_text: Option<String>,
    /// Error message
    pub error: Option<String>,
}

impl LibreTranslate {
    /// Create a new LibreTranslate client
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    fn request<'a>(&'a self, text: &'a str, source: &'a str, target: &'a str) -> LibreTranslateRequest<'a> {
        LibreTranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: if self.api_key.is_empty() { None } else { Some(self.api_key.as_str()) },
        }
    }
}

#[async_trait]
impl Translator for LibreTranslate {
    fn name(&self) -> &str {
        "libretranslate"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let url = format!("{}/translate", self.endpoint.trim_end_matches('/'));

        let response = self.client.post(&url)
            .json(&self.request(text, source_language, target_language))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Error bodies are `{"error": "..."}`; prefer the message over raw JSON
            let message = serde_json::from_str::<LibreTranslateResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or(body);
            return Err(status_error(status, &message));
        }

        let parsed: LibreTranslateResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::Malformed(format!("invalid JSON: {}", e)))?;

        match (parsed.translated_text, parsed.error) {
            (Some(text), _) => Ok(text),
            (None, Some(error)) => Err(TranslationError::BackendError { status: status.as_u16(), message: error }),
            (None, None) => Err(TranslationError::Malformed("missing translatedText".to_string())),
        }
    }
}
