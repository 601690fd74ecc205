/*!
 * Run statistics.
 *
 * Counters are owned by a single run and threaded through the driver, so
 * several runs in one process never share state.
 */

use std::time::{Duration, Instant};

/// Counters for one batch run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Articles completed in this run
    pub articles_processed: usize,

    /// Articles skipped because a previous checkpoint already held them
    pub articles_resumed: usize,

    /// Articles where at least one chunk fell back to the original text
    pub articles_with_fallback: usize,

    /// Chunks sent to the backend
    pub total_chunks: usize,

    /// Chunks that came back translated
    pub translated_chunks: usize,

    /// Chunks that kept their original text
    pub fallback_chunks: usize,

    /// Rate-limit responses received
    pub rate_limit_hits: usize,

    /// Chunks that succeeded on the retry after a cooldown
    pub retry_successes: usize,

    /// Characters of source content handled
    pub source_chars: usize,

    /// Characters of output content produced
    pub output_chars: usize,

    /// Checkpoints written
    pub checkpoints_written: usize,

    /// Checkpoint writes that failed
    pub checkpoint_failures: usize,

    /// Backend name
    pub provider: String,

    /// Start time of the run
    pub start_time: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::with_provider(String::new())
    }

    /// Create empty stats labelled with the backend name
    pub fn with_provider(provider: impl Into<String>) -> Self {
        Self {
            articles_processed: 0,
            articles_resumed: 0,
            articles_with_fallback: 0,
            total_chunks: 0,
            translated_chunks: 0,
            fallback_chunks: 0,
            rate_limit_hits: 0,
            retry_successes: 0,
            source_chars: 0,
            output_chars: 0,
            checkpoints_written: 0,
            checkpoint_failures: 0,
            provider: provider.into(),
            start_time: Instant::now(),
        }
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of chunks that were translated, 0.0 to 1.0
    pub fn success_ratio(&self) -> f64 {
        if self.total_chunks == 0 {
            return 1.0;
        }
        self.translated_chunks as f64 / self.total_chunks as f64
    }

    /// Whether a rerun with longer cooldowns is worth considering
    pub fn has_fallbacks(&self) -> bool {
        self.fallback_chunks > 0
    }

    /// Generate a summary of the run
    pub fn summary(&self) -> String {
        format!(
            "Translation Summary:\n\
             Provider: {}\n\
             Articles: {} processed, {} resumed, {} with untranslated parts\n\
             Chunks: {} total, {} translated, {} kept original ({:.1}% translated)\n\
             Rate limits: {} hit, {} recovered after cooldown\n\
             Characters: {} in, {} out\n\
             Checkpoints: {} written, {} failed\n\
             Elapsed time: {}",
            self.provider,
            self.articles_processed,
            self.articles_resumed,
            self.articles_with_fallback,
            self.total_chunks,
            self.translated_chunks,
            self.fallback_chunks,
            self.success_ratio() * 100.0,
            self.rate_limit_hits,
            self.retry_successes,
            self.source_chars,
            self.output_chars,
            self.checkpoints_written,
            self.checkpoint_failures,
            format_duration(self.elapsed()),
        )
    }
}

/// Format duration in a human-readable format
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
