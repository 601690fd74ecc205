use async_trait::async_trait;
use anyhow::Result;
use log::trace;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::errors::TranslationError;
use super::{check_status, http_client, Translator};

/// Client for the unofficial Google Translate web endpoint
///
/// `GET /translate_a/single?client=gtx&dt=t` answers with nested arrays; the
/// first element lists `[translated, original, ...]` segments, one per
/// sentence, which are concatenated back together.
#[derive(Debug)]
pub struct Google {
    /// HTTP client for API requests
    client: Client,
    /// Base URL, e.g. `https://translate.googleapis.com`
    endpoint: String,
}

impl Google {
    /// Create a new Google client
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    /// Build the request URL with the text as a query parameter
    fn request_url(&self, text: &str, source_language: &str, target_language: &str) -> Result<Url, TranslationError> {
        let base = format!("{}/translate_a/single", self.endpoint.trim_end_matches('/'));
        Url::parse_with_params(
            &base,
            &[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|e| TranslationError::transport(format!("Invalid Google endpoint {}: {}", base, e)))
    }

    /// Concatenate the translated segments of a response
    pub fn extract_text(json: &Value) -> Result<String, TranslationError> {
        let segments = json
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| TranslationError::Malformed("missing segment array at index 0".to_string()))?;

        let mut translated = String::new();
        for segment in segments {
            if let Some(part) = segment.get(0).and_then(Value::as_str) {
                translated.push_str(part);
            }
        }

        if translated.is_empty() {
            return Err(TranslationError::Malformed("no translated segments in response".to_string()));
        }

        Ok(translated)
    }
}

#[async_trait]
impl Translator for Google {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let url = self.request_url(text, source_language, target_language)?;

        let response = self.client.get(url).send().await?;
        let response = check_status(response).await?;

        let body = response.text().await?;
        trace!("Google response: {}", body);

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| TranslationError::Malformed(format!("invalid JSON: {}", e)))?;

        Self::extract_text(&json)
    }
}
