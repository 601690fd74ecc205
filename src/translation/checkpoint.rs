/*!
 * Progress checkpointing.
 *
 * A checkpoint is always a complete snapshot of the records finished so far,
 * written over the previous one. Recovering never needs replay: load the
 * last snapshot and skip that many input articles.
 */

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::article::ArticleRecord;
use crate::errors::AppError;
use crate::file_utils::FileManager;

/// Current on-disk snapshot layout
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to continue an interrupted run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    /// Layout version
    pub version: u32,

    /// Identifier of the run that wrote the snapshot
    pub run_id: String,

    /// SHA-256 of the input file, when known
    #[serde(default)]
    pub input_fingerprint: Option<String>,

    /// Source language of the run
    pub source_language: String,

    /// Target language of the run
    pub target_language: String,

    /// Completed records in input order
    pub records: Vec<ArticleRecord>,
}

impl CheckpointSnapshot {
    /// Take a snapshot of the given records
    pub fn new(
        run_id: impl Into<String>,
        input_fingerprint: Option<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        records: Vec<ArticleRecord>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            run_id: run_id.into(),
            input_fingerprint,
            source_language: source_language.into(),
            target_language: target_language.into(),
            records,
        }
    }

    /// Whether this snapshot was taken for the given input and language pair
    pub fn matches_run(&self, fingerprint: Option<&str>, source_language: &str, target_language: &str) -> bool {
        // Bare record lists carry no metadata; only the record prefix check applies
        if self.version == 0 {
            return true;
        }
        self.input_fingerprint.as_deref() == fingerprint
            && self.source_language == source_language
            && self.target_language == target_language
    }
}

/// Progress files written by older tools are a bare array of records
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCheckpoint {
    Snapshot(CheckpointSnapshot),
    Records(Vec<ArticleRecord>),
}

/// Durable destination for progress snapshots
pub trait CheckpointSink: Send + Sync {
    /// Replace the stored progress with this snapshot
    fn save(&self, snapshot: &CheckpointSnapshot) -> Result<(), AppError>;
}

/// Checkpoint stored as a pretty-printed JSON file, replaced atomically
#[derive(Debug, Clone)]
pub struct JsonFileCheckpoint {
    path: PathBuf,
}

impl JsonFileCheckpoint {
    /// Create a sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot, if the file exists
    pub fn load(&self) -> Result<Option<CheckpointSnapshot>, AppError> {
        if !FileManager::file_exists(&self.path) {
            return Ok(None);
        }

        let content = FileManager::read_to_string(&self.path)
            .map_err(|e| AppError::Checkpoint(format!("{:#}", e)))?;

        let stored: StoredCheckpoint = serde_json::from_str(&content).map_err(|e| {
            AppError::Checkpoint(format!("Failed to parse checkpoint {:?}: {}", self.path, e))
        })?;

        Ok(Some(match stored {
            StoredCheckpoint::Snapshot(snapshot) => snapshot,
            StoredCheckpoint::Records(records) => {
                warn!("Checkpoint {:?} has no run metadata, treating it as a plain record list", self.path);
                CheckpointSnapshot {
                    version: 0,
                    run_id: String::new(),
                    input_fingerprint: None,
                    source_language: String::new(),
                    target_language: String::new(),
                    records,
                }
            }
        }))
    }

    /// Delete the checkpoint file once the run has finished
    pub fn remove(&self) -> Result<(), AppError> {
        if FileManager::file_exists(&self.path) {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl CheckpointSink for JsonFileCheckpoint {
    fn save(&self, snapshot: &CheckpointSnapshot) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        FileManager::write_atomic(&self.path, &json)
            .map_err(|e| AppError::Checkpoint(format!("{:#}", e)))?;
        debug!("Checkpoint with {} records written to {:?}", snapshot.records.len(), self.path);
        Ok(())
    }
}

/// In-memory sink that keeps every snapshot it receives
#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    snapshots: Mutex<Vec<CheckpointSnapshot>>,
    fail_writes: bool,
}

impl MemoryCheckpoint {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose every write fails
    pub fn failing() -> Self {
        Self {
            snapshots: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }

    /// All snapshots saved so far, oldest first
    pub fn snapshots(&self) -> Vec<CheckpointSnapshot> {
        self.snapshots.lock().clone()
    }

    /// Most recent snapshot
    pub fn last(&self) -> Option<CheckpointSnapshot> {
        self.snapshots.lock().last().cloned()
    }

    /// Number of saves
    pub fn save_count(&self) -> usize {
        self.snapshots.lock().len()
    }
}

impl CheckpointSink for MemoryCheckpoint {
    fn save(&self, snapshot: &CheckpointSnapshot) -> Result<(), AppError> {
        if self.fail_writes {
            return Err(AppError::Checkpoint("Simulated checkpoint failure".to_string()));
        }
        self.snapshots.lock().push(snapshot.clone());
        Ok(())
    }
}
