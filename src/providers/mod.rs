/*!
 * Translation backend clients.
 *
 * Every backend implements [`Translator`]: one HTTP request per call, a
 * timeout enforced by the HTTP client, and rate-limit responses reported as
 * [`TranslationError::RateLimited`]. Clients never retry; pacing and retries
 * belong to the pipeline driver.
 *
 * - Google: unofficial Google Translate web endpoint
 * - MyMemory: community translation memory API
 * - LibreTranslate: open source translation server
 * - Mock: scripted behaviour for tests
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::TranslationError;

/// Common trait for all translation backends
///
/// This trait defines the interface that all backend implementations must follow,
/// allowing them to be used interchangeably by the pipeline driver.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Short backend name used in logs and summaries
    fn name(&self) -> &str;

    /// Translate one piece of text with a single request
    ///
    /// # Arguments
    /// * `text` - Text to translate, already within the backend's size limit
    /// * `source_language` - Backend language code, or `auto`
    /// * `target_language` - Backend language code
    ///
    /// # Returns
    /// * `Result<String, TranslationError>` - The translated text, verbatim
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError>;
}

pub mod google;
pub mod libretranslate;
pub mod mock;
pub mod mymemory;

/// Longest backend error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Browser-like agent; the Google web endpoint rejects unknown agents more often
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Build the HTTP client shared by all requests of one backend
pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(USER_AGENT)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .context("Failed to build HTTP client")
}

/// Shorten a response body for inclusion in an error
pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}…", head)
    } else {
        body.to_string()
    }
}

/// Map a non-success HTTP status and its body to a translation error
pub(crate) fn status_error(status: StatusCode, body: &str) -> TranslationError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        TranslationError::RateLimited(format!("{} {}", status, truncate_body(body)))
    } else {
        TranslationError::BackendError {
            status: status.as_u16(),
            message: truncate_body(body),
        }
    }
}

/// Pass successful responses through; turn everything else into an error
pub(crate) async fn check_status(response: Response) -> Result<Response, TranslationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// Create the backend selected in the configuration
pub fn build_translator(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    let endpoint = config.get_endpoint();
    let timeout = config.get_timeout();

    let translator: Arc<dyn Translator> = match config.provider {
        TranslationProvider::Google => Arc::new(google::Google::new(endpoint, timeout)?),
        TranslationProvider::MyMemory => {
            Arc::new(mymemory::MyMemory::new(endpoint, config.get_email(), timeout)?)
        }
        TranslationProvider::LibreTranslate => Arc::new(libretranslate::LibreTranslate::new(
            endpoint,
            config.get_api_key(),
            timeout,
        )?),
    };

    Ok(translator)
}
