/*!
 * Mock translator for testing.
 *
 * This module provides a translator that simulates the behaviours the
 * pipeline has to cope with:
 * - `MockTranslator::working()` - Always succeeds with tagged text
 * - `MockTranslator::rate_limited_once()` - First call per text is throttled
 * - `MockTranslator::failing()` - Always fails with a backend error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TranslationError;
use crate::providers::Translator;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Always fails with a backend error
    Failing,
    /// Throttled the first time each distinct text is seen, then succeeds
    RateLimitedOnce,
    /// Always throttled
    AlwaysRateLimited,
    /// Always times out
    TimingOut,
    /// Always returns an unparsable response
    Malformed,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Mock translator for testing pipeline behavior
#[derive(Debug)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total number of calls
    request_count: Arc<AtomicUsize>,
    /// Texts received, in call order
    calls: Arc<Mutex<Vec<String>>>,
    /// Texts already throttled once
    throttled: Arc<Mutex<HashSet<String>>>,
    /// Queued outcomes that take precedence over the behavior
    script: Arc<Mutex<VecDeque<Result<String, TranslationError>>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str, &str) -> String>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            throttled: Arc::new(Mutex::new(HashSet::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            custom_response: None,
        }
    }

    /// Create a working mock that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock throttling the first request for each text
    pub fn rate_limited_once() -> Self {
        Self::new(MockBehavior::RateLimitedOnce)
    }

    /// Create a mock that is always throttled
    pub fn always_rate_limited() -> Self {
        Self::new(MockBehavior::AlwaysRateLimited)
    }

    /// Create a mock that always times out
    pub fn timing_out() -> Self {
        Self::new(MockBehavior::TimingOut)
    }

    /// Create an intermittently failing mock
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Set a custom response generator taking `(text, target_language)`
    pub fn with_custom_response(mut self, generator: fn(&str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Queue outcomes returned, in order, before the behavior applies
    pub fn with_script(self, outcomes: Vec<Result<String, TranslationError>>) -> Self {
        self.script.lock().extend(outcomes);
        self
    }

    /// The translation the working behavior produces for a text
    pub fn translation_of(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }

    /// Total number of calls made
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts received, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of calls made with this exact text
    pub fn calls_for(&self, text: &str) -> usize {
        self.calls.lock().iter().filter(|t| t.as_str() == text).count()
    }

    fn success(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        Ok(match self.custom_response {
            Some(generator) => generator(text, target_language),
            None => Self::translation_of(text, target_language),
        })
    }
}

impl Clone for MockTranslator {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            calls: Arc::clone(&self.calls),
            throttled: Arc::clone(&self.throttled),
            script: Arc::clone(&self.script),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(text.to_string());

        if let Some(outcome) = self.script.lock().pop_front() {
            return outcome;
        }

        match self.behavior {
            MockBehavior::Working => self.success(text, target_language),

            MockBehavior::Failing => Err(TranslationError::BackendError {
                status: 500,
                message: "Simulated backend failure".to_string(),
            }),

            MockBehavior::RateLimitedOnce => {
                if self.throttled.lock().insert(text.to_string()) {
                    Err(TranslationError::RateLimited("Simulated rate limit".to_string()))
                } else {
                    self.success(text, target_language)
                }
            }

            MockBehavior::AlwaysRateLimited => {
                Err(TranslationError::RateLimited("Simulated rate limit".to_string()))
            }

            MockBehavior::TimingOut => Err(TranslationError::Timeout),

            MockBehavior::Malformed => Err(TranslationError::Malformed("Simulated garbage".to_string())),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(TranslationError::BackendError {
                        status: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    self.success(text, target_language)
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                self.success(text, target_language)
            }
        }
    }
}
