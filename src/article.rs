use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::AppError;
use crate::file_utils::FileManager;

// @module: Article records and run progress

/// One article as read from the input file.
///
/// Records are never edited in place; `with_content` builds the output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    /// Headline
    pub title: String,

    /// Body text, the only field that gets translated
    pub content: String,

    /// Publisher name
    #[serde(default)]
    pub source: String,

    /// Link to the original article
    #[serde(default)]
    pub source_url: String,

    /// Editorial category
    #[serde(default)]
    pub category: String,
}

impl ArticleRecord {
    /// Create a new record
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        source_url: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: source.into(),
            source_url: source_url.into(),
            category: category.into(),
        }
    }

    /// Copy of this record carrying different content
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }

    /// Whether two records describe the same source article
    pub fn same_article(&self, other: &ArticleRecord) -> bool {
        self.title == other.title && self.source_url == other.source_url
    }

    /// Content length in characters
    pub fn content_chars(&self) -> usize {
        self.content.chars().count()
    }
}

/// The ordered list of articles read at job start
#[derive(Debug, Clone)]
pub struct ArticleCollection {
    /// File the articles were read from
    pub source_file: PathBuf,

    /// Articles in input order
    pub articles: Vec<ArticleRecord>,
}

impl ArticleCollection {
    /// Read the whole input file.
    ///
    /// A missing or unparsable file is fatal: nothing has been processed yet,
    /// so there is nothing to fall back to.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();

        if !FileManager::file_exists(path) {
            return Err(AppError::FatalInput(format!("Input file does not exist: {:?}", path)));
        }

        let content = FileManager::read_to_string(path)
            .map_err(|e| AppError::FatalInput(format!("{:#}", e)))?;

        let articles = Self::parse_json(&content)
            .map_err(|e| AppError::FatalInput(format!("Failed to parse {:?}: {}", path, e)))?;

        debug!("Loaded {} articles from {:?}", articles.len(), path);

        Ok(Self {
            source_file: path.to_path_buf(),
            articles,
        })
    }

    /// Parse a JSON array of article records
    pub fn parse_json(content: &str) -> Result<Vec<ArticleRecord>, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Number of articles
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether the input held no articles
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Total characters of content across all articles
    pub fn total_content_chars(&self) -> usize {
        self.articles.iter().map(ArticleRecord::content_chars).sum()
    }
}

/// Completed output records of a run, in input order.
///
/// Owned by the pipeline driver; checkpoints only ever see snapshots of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProgress {
    records: Vec<ArticleRecord>,
}

impl RunProgress {
    /// Create empty progress
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild progress from a previous checkpoint.
    ///
    /// The checkpoint is only trusted when its records line up, position by
    /// position, with the head of the current input. Anything else starts the
    /// run from scratch.
    pub fn resume(previous: Vec<ArticleRecord>, input: &[ArticleRecord]) -> Self {
        if previous.len() > input.len() {
            warn!(
                "Checkpoint holds {} articles but input only has {}, starting over",
                previous.len(),
                input.len()
            );
            return Self::new();
        }

        let mismatch = previous
            .iter()
            .zip(input.iter())
            .position(|(done, original)| !done.same_article(original));

        if let Some(index) = mismatch {
            warn!("Checkpoint diverges from input at article {}, starting over", index + 1);
            return Self::new();
        }

        Self { records: previous }
    }

    /// Append a completed article
    pub fn push(&mut self, record: ArticleRecord) {
        self.records.push(record);
    }

    /// Number of completed articles
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been completed yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current snapshot
    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    /// Consume and return the records
    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.records
    }
}
