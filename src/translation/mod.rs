/*!
 * Article translation pipeline.
 *
 * This module contains the core functionality for translating articles
 * through a rate-limited backend. It is split into several submodules:
 *
 * - `chunker`: Sentence-aware splitting of content into bounded chunks
 * - `pipeline`: Sequential, paced driver with fail-open fallback
 * - `checkpoint`: Full-snapshot progress persistence
 * - `stats`: Per-run counters and the final summary
 */

// Re-export main types for easier usage
pub use self::checkpoint::{CheckpointSink, CheckpointSnapshot, JsonFileCheckpoint, MemoryCheckpoint};
pub use self::chunker::{Chunk, Sentence};
pub use self::pipeline::{ArticleOutcome, BatchReport, BatchTranslator, PipelineEvent, PipelineOptions};
pub use self::stats::RunStats;

// Submodules
pub mod checkpoint;
pub mod chunker;
pub mod pipeline;
pub mod stats;

/// Outcome of translating one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    /// Index of the chunk this result belongs to
    pub sequence_index: usize,
    /// Translated text, or the original chunk text when `succeeded` is false
    pub text: String,
    /// Whether the backend produced the text
    pub succeeded: bool,
    /// Whitespace placed before this text on reassembly
    pub separator: String,
}

impl TranslationResult {
    /// Result carrying a backend translation
    pub fn translated(chunk: &Chunk, text: String) -> Self {
        Self {
            sequence_index: chunk.sequence_index,
            text,
            succeeded: true,
            separator: chunk.separator.clone(),
        }
    }

    /// Result carrying the original chunk text unchanged
    pub fn fallback(chunk: &Chunk) -> Self {
        Self {
            sequence_index: chunk.sequence_index,
            text: chunk.text.clone(),
            succeeded: false,
            separator: chunk.separator.clone(),
        }
    }
}
