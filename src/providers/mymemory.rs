use async_trait::async_trait;
use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::errors::TranslationError;
use super::{check_status, http_client, truncate_body, Translator};

/// Marker MyMemory puts in `translatedText` when the daily quota is used up
const QUOTA_WARNING: &str = "MYMEMORY WARNING";

/// MyMemory client for the free community translation API
#[derive(Debug)]
pub struct MyMemory {
    /// HTTP client for API requests
    client: Client,
    /// Base URL, e.g. `https://api.mymemory.translated.net`
    endpoint: String,
    /// Optional contact email, raises the anonymous daily quota
    email: String,
}

/// MyMemory `/get` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyMemoryResponse {
    /// Translation payload
    pub response_data: Option<MyMemoryData>,
    /// Status code, sent as a number or as a string
    #[serde(default)]
    pub response_status: Value,
    /// Free-form detail on errors
    #[serde(default)]
    pub response_details: Value,
}

/// Translation payload of a MyMemory response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyMemoryData {
    /// The translated text
    pub translated_text: Option<String>,
}

impl MyMemoryResponse {
    /// Status as a number; a missing status counts as success
    pub fn status(&self) -> u16 {
        match &self.response_status {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()).unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 200,
        }
    }

    fn details(&self) -> String {
        match &self.response_details {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Turn the response into text or a classified error
    pub fn into_result(self) -> Result<String, TranslationError> {
        let status = self.status();
        let details = self.details();
        let text = self
            .response_data
            .and_then(|d| d.translated_text)
            .unwrap_or_default();

        if status == 429 || text.starts_with(QUOTA_WARNING) || details.starts_with(QUOTA_WARNING) {
            let message = if details.is_empty() { text } else { details };
            return Err(TranslationError::RateLimited(truncate_body(&message)));
        }

        if status != 200 {
            let message = if details.is_empty() { text } else { details };
            return Err(TranslationError::BackendError {
                status,
                message: truncate_body(&message),
            });
        }

        if text.is_empty() {
            return Err(TranslationError::Malformed("missing responseData.translatedText".to_string()));
        }

        Ok(text)
    }
}

impl MyMemory {
    /// Create a new MyMemory client
    pub fn new(endpoint: impl Into<String>, email: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
            email: email.into(),
        })
    }

    /// MyMemory expects `Autodetect` rather than `auto`
    fn source_code(source_language: &str) -> &str {
        if source_language.eq_ignore_ascii_case(crate::language_utils::AUTO_DETECT) {
            "Autodetect"
        } else {
            source_language
        }
    }

    /// Build the request URL
    fn request_url(&self, text: &str, source_language: &str, target_language: &str) -> Result<Url, TranslationError> {
        let base = format!("{}/get", self.endpoint.trim_end_matches('/'));
        let langpair = format!("{}|{}", Self::source_code(source_language), target_language);

        let mut params = vec![("q", text), ("langpair", langpair.as_str())];
        if !self.email.is_empty() {
            params.push(("de", self.email.as_str()));
        }

        Url::parse_with_params(&base, &params)
            .map_err(|e| TranslationError::transport(format!("Invalid MyMemory endpoint {}: {}", base, e)))
    }
}

#[async_trait]
impl Translator for MyMemory {
    fn name(&self) -> &str {
        "mymemory"
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
        let parsed: MyMemoryResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::Malformed(format!("invalid JSON: {}", e)))?;

        parsed.into_result()
    }
}
