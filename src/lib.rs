/*!
 * # Article Translator
 *
 * A Rust library for resilient batch translation of news articles through
 * free, rate-limited translation backends.
 *
 * ## Features
 *
 * - Sentence-aware chunking bounded by each backend's request size
 * - Translate articles using pluggable HTTP backends:
 *   - Google (unofficial web endpoint)
 *   - MyMemory
 *   - LibreTranslate
 * - Strictly sequential requests with mandatory pacing
 * - Cooldown and single retry on rate limits, original text kept on failure
 * - Full-snapshot progress checkpoints with resume
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `article`: Article records, input loading and run progress
 * - `translation`: The translation pipeline:
 *   - `translation::chunker`: Splitting content into bounded chunks
 *   - `translation::pipeline`: Sequential batch driver
 *   - `translation::checkpoint`: Progress snapshots
 *   - `translation::stats`: Run counters and summary
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for the translation backends
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod article;
pub mod file_utils;
pub mod translation;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use article::{ArticleCollection, ArticleRecord, RunProgress};
pub use translation::{BatchReport, BatchTranslator, PipelineEvent, PipelineOptions, RunStats};
pub use providers::Translator;
pub use language_utils::{language_codes_match, get_language_name};
pub use errors::{AppError, TranslationError};
