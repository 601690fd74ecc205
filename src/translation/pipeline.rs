/*!
 * Sequential batch translation driver.
 *
 * Articles are processed one at a time, chunks one at a time, with exactly
 * one request in flight. Every request is followed by a fixed pause, a
 * rate-limit answer buys one retry after a long cooldown, and any chunk the
 * backend cannot translate keeps its original text. Completed articles are
 * checkpointed as full snapshots.
 */

use anyhow::Result;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::article::{ArticleRecord, RunProgress};
use crate::errors::TranslationError;
use crate::language_utils;
use crate::providers::Translator;

use super::checkpoint::{CheckpointSink, CheckpointSnapshot};
use super::chunker::{self, Chunk};
use super::stats::RunStats;
use super::TranslationResult;

/// Tuning for one run of the driver
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Largest chunk sent in one request, in characters
    pub max_chunk_chars: usize,

    /// Pause after every request
    pub inter_request_delay: Duration,

    /// Wait after a rate-limit answer before the single retry
    pub rate_limit_cooldown: Duration,

    /// Completed articles between checkpoints
    pub checkpoint_every: usize,

    /// Backend source language code
    pub source_language: String,

    /// Backend target language code
    pub target_language: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_chunk_chars: 4500,
            inter_request_delay: Duration::from_millis(1000),
            rate_limit_cooldown: Duration::from_secs(60),
            checkpoint_every: 5,
            source_language: "en".to_string(),
            target_language: "ko".to_string(),
        }
    }
}

impl PipelineOptions {
    /// Resolve options for the active backend of a configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            max_chunk_chars: config.translation.get_max_chars_per_request(),
            inter_request_delay: config.translation.get_inter_request_delay(),
            rate_limit_cooldown: config.translation.get_rate_limit_cooldown(),
            checkpoint_every: config.checkpoint.every_n,
            source_language: language_utils::to_backend_source_code(&config.source_language)?,
            target_language: language_utils::to_backend_code(&config.target_language)?,
        })
    }
}

/// Progress notifications emitted while a batch runs
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// An article is about to be chunked
    ArticleStarted { index: usize, total: usize, title: String },

    /// The article was split into this many chunks
    ChunksPlanned { index: usize, chunks: usize, chars: usize },

    /// A chunk came back translated
    ChunkTranslated { index: usize, chunk: usize, retried: bool },

    /// A chunk kept its original text
    ChunkFellBack { index: usize, chunk: usize, error: TranslationError },

    /// The backend throttled a request; the driver is cooling down
    RateLimited { index: usize, chunk: usize, cooldown: Duration },

    /// An article is complete and recorded
    ArticleFinished { index: usize, translated_chunks: usize, fallback_chunks: usize },

    /// A checkpoint holding this many records was written
    CheckpointWritten { records: usize },

    /// Writing a checkpoint failed; the run continues
    CheckpointFailed { records: usize, error: String },

    /// The run stopped early; this many records are complete
    Cancelled { completed: usize },
}

/// Callback receiving pipeline events
pub type EventHandler = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Result of translating a single article
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleOutcome {
    /// Output record with the reassembled content
    pub record: ArticleRecord,

    /// Per-chunk results in sequence order
    pub results: Vec<TranslationResult>,

    /// Chunks the backend translated
    pub translated_chunks: usize,

    /// Chunks that kept their original text
    pub fallback_chunks: usize,

    /// Rate-limit answers received for this article
    pub rate_limit_hits: usize,

    /// Chunks translated on the retry after a cooldown
    pub retry_successes: usize,
}

/// What a batch run produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One record per processed input article, in input order
    pub records: Vec<ArticleRecord>,

    /// Counters for the run
    pub stats: RunStats,

    /// Whether the run stopped before the last article
    pub cancelled: bool,
}

/// Drives a translator over a list of articles
pub struct BatchTranslator {
    /// Backend used for every request
    translator: Arc<dyn Translator>,

    /// Pacing, chunking and checkpoint settings
    options: PipelineOptions,

    /// Optional progress callback
    event_handler: Option<EventHandler>,

    /// Stops the run between chunks or during a pause
    cancel: CancellationToken,

    /// Identifier stamped on every checkpoint
    run_id: String,

    /// Fingerprint of the input, stamped on every checkpoint
    input_fingerprint: Option<String>,
}

impl fmt::Debug for BatchTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchTranslator")
            .field("translator", &self.translator.name())
            .field("options", &self.options)
            .field("run_id", &self.run_id)
            .finish()
    }
}

impl BatchTranslator {
    /// Create a driver for the given backend
    pub fn new(translator: Arc<dyn Translator>, options: PipelineOptions) -> Self {
        Self {
            translator,
            options,
            event_handler: None,
            cancel: CancellationToken::new(),
            run_id: uuid::Uuid::new_v4().to_string(),
            input_fingerprint: None,
        }
    }

    /// Deliver progress events to a callback
    pub fn with_event_handler(mut self, handler: impl Fn(&PipelineEvent) + Send + Sync + 'static) -> Self {
        self.event_handler = Some(Arc::new(handler));
        self
    }

    /// Stop the run when this token is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Identify the run and its input in checkpoints
    pub fn with_run_identity(mut self, run_id: impl Into<String>, input_fingerprint: Option<String>) -> Self {
        self.run_id = run_id.into();
        self.input_fingerprint = input_fingerprint;
        self
    }

    /// Options in effect
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Identifier stamped on checkpoints
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(handler) = &self.event_handler {
            handler(&event);
        }
    }

    /// Sleep unless the run is cancelled first
    async fn pause(&self, duration: Duration) -> Result<(), TranslationError> {
        if duration.is_zero() {
            return if self.cancel.is_cancelled() { Err(TranslationError::Cancelled) } else { Ok(()) };
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(TranslationError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// One backend call; an empty answer counts as malformed
    async fn request(&self, chunk: &Chunk) -> Result<String, TranslationError> {
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(TranslationError::Cancelled),
            response = self.translator.translate(
                &chunk.text,
                &self.options.source_language,
                &self.options.target_language,
            ) => response,
        };

        match response {
            Ok(text) if text.trim().is_empty() => {
                Err(TranslationError::Malformed("backend returned empty text".to_string()))
            }
            other => other,
        }
    }

    /// Translate one chunk with the pacing and retry policy.
    ///
    /// Only cancellation is returned as an error; every backend failure
    /// becomes a fallback result.
    async fn translate_chunk(
        &self,
        index: usize,
        chunk: &Chunk,
        outcome: &mut ArticleOutcome,
    ) -> Result<TranslationResult, TranslationError> {
        let first = self.request(chunk).await;

        let (answer, retried) = match first {
            Err(TranslationError::Cancelled) => return Err(TranslationError::Cancelled),
            Err(error) if error.is_rate_limited() => {
                outcome.rate_limit_hits += 1;
                warn!(
                    "Rate limited on article {} chunk {}: {}. Cooling down for {:?}",
                    index + 1,
                    chunk.sequence_index + 1,
                    error,
                    self.options.rate_limit_cooldown
                );
                self.emit(PipelineEvent::RateLimited {
                    index,
                    chunk: chunk.sequence_index,
                    cooldown: self.options.rate_limit_cooldown,
                });
                self.pause(self.options.rate_limit_cooldown).await?;

                let second = self.request(chunk).await;
                if matches!(second, Err(TranslationError::Cancelled)) {
                    return Err(TranslationError::Cancelled);
                }
                if matches!(second, Err(ref e) if e.is_rate_limited()) {
                    outcome.rate_limit_hits += 1;
                }
                (second, true)
            }
            other => (other, false),
        };

        let result = match answer {
            Ok(text) => {
                outcome.translated_chunks += 1;
                if retried {
                    outcome.retry_successes += 1;
                }
                self.emit(PipelineEvent::ChunkTranslated { index, chunk: chunk.sequence_index, retried });
                TranslationResult::translated(chunk, text)
            }
            Err(error) => {
                outcome.fallback_chunks += 1;
                warn!(
                    "Keeping original text for article {} chunk {}: {}",
                    index + 1,
                    chunk.sequence_index + 1,
                    error
                );
                self.emit(PipelineEvent::ChunkFellBack { index, chunk: chunk.sequence_index, error });
                TranslationResult::fallback(chunk)
            }
        };

        self.pause(self.options.inter_request_delay).await?;

        Ok(result)
    }

    /// Translate a single article.
    ///
    /// Never fails because of the backend; returns
    /// `Err(TranslationError::Cancelled)` only when the run is cancelled
    /// before the article is complete.
    pub async fn translate_article(
        &self,
        index: usize,
        article: &ArticleRecord,
    ) -> Result<ArticleOutcome, TranslationError> {
        let chunks = chunker::split(&article.content, self.options.max_chunk_chars);
        debug!(
            "Article {} split into {} chunks ({} chars)",
            index + 1,
            chunks.len(),
            article.content_chars()
        );
        self.emit(PipelineEvent::ChunksPlanned { index, chunks: chunks.len(), chars: article.content_chars() });

        let mut outcome = ArticleOutcome {
            record: article.clone(),
            results: Vec::with_capacity(chunks.len()),
            translated_chunks: 0,
            fallback_chunks: 0,
            rate_limit_hits: 0,
            retry_successes: 0,
        };

        for chunk in &chunks {
            if self.cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }
            let result = self.translate_chunk(index, chunk, &mut outcome).await?;
            outcome.results.push(result);
        }

        outcome.record = article.with_content(chunker::reassemble(&outcome.results));
        Ok(outcome)
    }

    /// Save a snapshot of the progress; failures are logged and counted
    fn checkpoint(&self, sink: &dyn CheckpointSink, progress: &RunProgress, stats: &mut RunStats) {
        let snapshot = CheckpointSnapshot::new(
            self.run_id.clone(),
            self.input_fingerprint.clone(),
            self.options.source_language.clone(),
            self.options.target_language.clone(),
            progress.records().to_vec(),
        );

        match sink.save(&snapshot) {
            Ok(()) => {
                stats.checkpoints_written += 1;
                info!("Checkpoint saved with {} articles", progress.len());
                self.emit(PipelineEvent::CheckpointWritten { records: progress.len() });
            }
            Err(e) => {
                stats.checkpoint_failures += 1;
                warn!("Failed to save checkpoint with {} articles: {}", progress.len(), e);
                self.emit(PipelineEvent::CheckpointFailed { records: progress.len(), error: e.to_string() });
            }
        }
    }

    /// Translate every article not already held by `progress`.
    ///
    /// Articles already in `progress` (from a resumed checkpoint) are
    /// skipped; the rest are translated in order and appended. The sink gets
    /// a full snapshot every `checkpoint_every` completed articles and once
    /// more when the run ends, whether it finished or was cancelled.
    pub async fn run(
        &self,
        articles: &[ArticleRecord],
        mut progress: RunProgress,
        sink: &dyn CheckpointSink,
    ) -> BatchReport {
        let mut stats = RunStats::with_provider(self.translator.name());
        let checkpoint_every = self.options.checkpoint_every.max(1);
        let total = articles.len();
        let mut last_checkpoint_len: Option<usize> = None;
        let mut cancelled = false;

        stats.articles_resumed = progress.len().min(total);
        if stats.articles_resumed > 0 {
            info!("Resuming after {} already translated articles", stats.articles_resumed);
        }

        for (index, article) in articles.iter().enumerate().skip(progress.len()) {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            self.emit(PipelineEvent::ArticleStarted { index, total, title: article.title.clone() });
            info!("Translating article {}/{}: {}", index + 1, total, article.title);

            let outcome = match self.translate_article(index, article).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    cancelled = true;
                    break;
                }
            };

            stats.articles_processed += 1;
            stats.total_chunks += outcome.results.len();
            stats.translated_chunks += outcome.translated_chunks;
            stats.fallback_chunks += outcome.fallback_chunks;
            stats.rate_limit_hits += outcome.rate_limit_hits;
            stats.retry_successes += outcome.retry_successes;
            stats.source_chars += article.content_chars();
            stats.output_chars += outcome.record.content_chars();
            if outcome.fallback_chunks > 0 {
                stats.articles_with_fallback += 1;
            }

            info!(
                "Article {}/{} done: {} chunks translated, {} kept original",
                index + 1,
                total,
                outcome.translated_chunks,
                outcome.fallback_chunks
            );
            self.emit(PipelineEvent::ArticleFinished {
                index,
                translated_chunks: outcome.translated_chunks,
                fallback_chunks: outcome.fallback_chunks,
            });

            progress.push(outcome.record);

            if progress.len() % checkpoint_every == 0 {
                self.checkpoint(sink, &progress, &mut stats);
                last_checkpoint_len = Some(progress.len());
            }
        }

        if cancelled {
            warn!("Run cancelled after {} of {} articles", progress.len(), total);
            self.emit(PipelineEvent::Cancelled { completed: progress.len() });
        }

        if last_checkpoint_len != Some(progress.len()) {
            self.checkpoint(sink, &progress, &mut stats);
        }

        BatchReport {
            records: progress.into_records(),
            stats,
            cancelled,
        }
    }
}
