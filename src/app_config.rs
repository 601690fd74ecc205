use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::errors::AppError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO, or "auto")
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Progress checkpoint config
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Unofficial Google Translate web endpoint
    #[default]
    Google,
    // @provider: MyMemory community translation API
    MyMemory,
    // @provider: LibreTranslate (public or self-hosted)
    LibreTranslate,
}

impl TranslationProvider {
    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::MyMemory => "mymemory".to_string(),
            Self::LibreTranslate => "libretranslate".to_string(),
        }
    }

    /// All known backends
    pub fn all() -> [TranslationProvider; 3] {
        [Self::Google, Self::MyMemory, Self::LibreTranslate]
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "mymemory" => Ok(Self::MyMemory),
            "libretranslate" | "libre" => Ok(Self::LibreTranslate),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Per-backend settings.
///
/// Request size and pacing differ a lot between the free endpoints, so both
/// live here rather than in one global value.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: API key (LibreTranslate instances that require one)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Contact email (raises the MyMemory daily quota)
    #[serde(default = "String::new")]
    pub email: String,

    // @field: Max chars per request
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,

    // @field: Pause after each successful request, overrides the common value
    #[serde(default)]
    pub inter_request_delay_ms: Option<u64>,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::Google => Self {
                provider_type: "google".to_string(),
                endpoint: default_google_endpoint(),
                api_key: String::new(),
                email: String::new(),
                max_chars_per_request: default_google_max_chars(),
                inter_request_delay_ms: Some(1000),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::MyMemory => Self {
                provider_type: "mymemory".to_string(),
                endpoint: default_mymemory_endpoint(),
                api_key: String::new(),
                email: String::new(),
                max_chars_per_request: default_mymemory_max_chars(),
                inter_request_delay_ms: Some(2000),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::LibreTranslate => Self {
                provider_type: "libretranslate".to_string(),
                endpoint: default_libretranslate_endpoint(),
                api_key: String::new(),
                email: String::new(),
                max_chars_per_request: default_libretranslate_max_chars(),
                inter_request_delay_ms: None,
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Pacing settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Delay in milliseconds after every successful request
    #[serde(default = "default_inter_request_delay_ms")]
    pub inter_request_delay_ms: u64,

    /// Wait in milliseconds after a rate-limit response before the single retry
    #[serde(default = "default_rate_limit_cooldown_ms")]
    pub rate_limit_cooldown_ms: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            inter_request_delay_ms: default_inter_request_delay_ms(),
            rate_limit_cooldown_ms: default_rate_limit_cooldown_ms(),
        }
    }
}

/// Progress checkpoint settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CheckpointConfig {
    /// Write a checkpoint after every N completed articles
    #[serde(default = "default_checkpoint_every")]
    pub every_n: usize,

    /// Progress file; defaults to `<input>.<target>.progress.json`
    #[serde(default)]
    pub progress_file: Option<PathBuf>,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            every_n: default_checkpoint_every(),
            progress_file: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_max_chars_per_request() -> usize {
    900
}

fn default_google_max_chars() -> usize {
    4500 // the web endpoint rejects queries near 5000 chars
}

fn default_mymemory_max_chars() -> usize {
    450 // MyMemory caps a query at 500 bytes
}

fn default_libretranslate_max_chars() -> usize {
    1500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_inter_request_delay_ms() -> u64 {
    1000
}

fn default_rate_limit_cooldown_ms() -> u64 {
    60_000
}

fn default_checkpoint_every() -> usize {
    5
}

fn default_google_endpoint() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_mymemory_endpoint() -> String {
    "https://api.mymemory.translated.net".to_string()
}

fn default_libretranslate_endpoint() -> String {
    "https://libretranslate.com".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |message: String| AppError::Config(message);

        // Validate languages
        crate::language_utils::to_backend_source_code(&self.source_language)
            .map_err(|e| invalid(format!("source_language: {}", e)))?;
        crate::language_utils::to_backend_code(&self.target_language)
            .map_err(|e| invalid(format!("target_language: {}", e)))?;

        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(invalid(format!(
                "Source and target language are the same: {}",
                self.target_language
            )));
        }

        if self.translation.get_max_chars_per_request() == 0 {
            return Err(invalid("max_chars_per_request must be greater than zero".to_string()));
        }

        if self.checkpoint.every_n == 0 {
            return Err(invalid("checkpoint.every_n must be greater than zero".to_string()));
        }

        let endpoint = self.translation.get_endpoint();
        Url::parse(&endpoint).map_err(|e| {
            invalid(format!("Invalid endpoint for {}: {} ({})", self.translation.provider, endpoint, e))
        })?;

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "ko".to_string(),
            translation: TranslationConfig::default(),
            checkpoint: CheckpointConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created on demand
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            TranslationProvider::Google => default_google_endpoint(),
            TranslationProvider::MyMemory => default_mymemory_endpoint(),
            TranslationProvider::LibreTranslate => default_libretranslate_endpoint(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the contact email for the active provider
    pub fn get_email(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.email.clone())
            .unwrap_or_default()
    }

    /// Get the max chars per request for the active provider
    pub fn get_max_chars_per_request(&self) -> usize {
        if let Some(provider_config) = self.get_active_provider_config() {
            return provider_config.max_chars_per_request;
        }

        match self.provider {
            TranslationProvider::Google => default_google_max_chars(),
            TranslationProvider::MyMemory => default_mymemory_max_chars(),
            TranslationProvider::LibreTranslate => default_libretranslate_max_chars(),
        }
    }

    /// Pause after each successful request for the active provider
    pub fn get_inter_request_delay(&self) -> Duration {
        let ms = self.get_active_provider_config()
            .and_then(|p| p.inter_request_delay_ms)
            .unwrap_or(self.common.inter_request_delay_ms);
        Duration::from_millis(ms)
    }

    /// Cooldown after a rate-limit response
    pub fn get_rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.common.rate_limit_cooldown_ms)
    }

    /// Request timeout for the active provider
    pub fn get_timeout(&self) -> Duration {
        let secs = self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .unwrap_or_else(default_timeout_secs);
        Duration::from_secs(secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: TranslationProvider::all()
                .into_iter()
                .map(ProviderConfig::new)
                .collect(),
            common: TranslationCommonConfig::default(),
        }
    }
}
