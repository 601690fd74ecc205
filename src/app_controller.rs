use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::article::{ArticleCollection, RunProgress};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::{self, Translator};
use crate::translation::stats::format_duration;
use crate::translation::{BatchReport, BatchTranslator, JsonFileCheckpoint, PipelineEvent, PipelineOptions};

// @module: Application controller for batch article translation

/// How a controller run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The output already existed and overwriting was not requested
    Skipped { output_path: PathBuf },

    /// Every article was processed and the output file written
    Completed { output_path: PathBuf, report: BatchReport },

    /// The run was interrupted; progress is in the checkpoint file
    Cancelled { progress_path: PathBuf, report: BatchReport },
}

/// Main application controller for article translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Backend override, used instead of the configured one
    translator: Option<Arc<dyn Translator>>,

    // @field: Stops the run; cancelled on Ctrl-C when interrupts are handled
    cancel: CancellationToken,

    // @field: Whether Ctrl-C should cancel the run
    handle_interrupts: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        Ok(Self {
            config,
            translator: None,
            cancel: CancellationToken::new(),
            handle_interrupts: true,
        })
    }

    /// Use this backend instead of building one from the configuration
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Stop the run when this token is cancelled; Ctrl-C is not intercepted
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self.handle_interrupts = false;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output path used when none is given: `<stem>.<target>.json` next to the input
    pub fn default_output_path(&self, input_file: &Path) -> Result<PathBuf> {
        let target = language_utils::to_backend_code(&self.config.target_language)?;
        Ok(FileManager::generate_output_path(input_file, &target, "json"))
    }

    /// Checkpoint path: the configured one, or `<stem>.<target>.progress.json`
    pub fn progress_path(&self, input_file: &Path) -> Result<PathBuf> {
        if let Some(path) = &self.config.checkpoint.progress_file {
            return Ok(path.clone());
        }
        let target = language_utils::to_backend_code(&self.config.target_language)?;
        Ok(FileManager::generate_output_path(input_file, &target, "progress.json"))
    }

    /// Translate one article file.
    ///
    /// Fails only on fatal conditions: unreadable input, a backend that
    /// cannot be built, or an output file that cannot be written.
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
        resume: bool,
    ) -> Result<RunOutcome> {
        let collection = ArticleCollection::load(&input_file)?;
        info!(
            "Loaded {} articles ({} chars) from {:?}",
            collection.len(),
            collection.total_content_chars(),
            input_file
        );

        let output_path = match output_file {
            Some(path) => path,
            None => self.default_output_path(&input_file)?,
        };
        let progress_path = self.progress_path(&input_file)?;

        if FileManager::file_exists(&output_path) && !force_overwrite {
            warn!("Skipping file, translation already exists at {:?} (use -f to force overwrite)", output_path);
            return Ok(RunOutcome::Skipped { output_path });
        }

        let fingerprint = match FileManager::hash_file(&input_file) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!("Could not fingerprint input, resume checks will be weaker: {:#}", e);
                None
            }
        };

        let options = PipelineOptions::from_config(&self.config)?;
        let sink = JsonFileCheckpoint::new(&progress_path);
        let progress = self.initial_progress(&sink, &collection, fingerprint.as_deref(), &options, resume);

        let translator = match &self.translator {
            Some(translator) => Arc::clone(translator),
            None => providers::build_translator(&self.config.translation)?,
        };

        info!(
            "Translating {} → {} with {} ({} chars per request, {:?} between requests)",
            language_utils::get_language_name(&self.config.source_language).unwrap_or_else(|_| options.source_language.clone()),
            language_utils::get_language_name(&self.config.target_language).unwrap_or_else(|_| options.target_language.clone()),
            translator.name(),
            options.max_chunk_chars,
            options.inter_request_delay
        );

        let progress_bar = Self::create_progress_bar(collection.len(), progress.len());
        let bar = progress_bar.clone();

        let driver = BatchTranslator::new(translator, options)
            .with_run_identity(uuid::Uuid::new_v4().to_string(), fingerprint)
            .with_cancellation(self.cancel.clone())
            .with_event_handler(move |event| Self::update_progress_bar(&bar, event));

        let interrupt_listener = self.handle_interrupts.then(|| {
            let token = self.cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping after saving progress");
                    token.cancel();
                }
            })
        });

        let report = driver.run(&collection.articles, progress, &sink).await;

        if let Some(listener) = interrupt_listener {
            listener.abort();
        }
        progress_bar.finish_and_clear();

        info!("{}", report.stats.summary());

        if report.cancelled {
            warn!(
                "Stopped after {} of {} articles; rerun with --resume to continue from {:?}",
                report.records.len(),
                collection.len(),
                progress_path
            );
            return Ok(RunOutcome::Cancelled { progress_path, report });
        }

        let json = serde_json::to_vec_pretty(&report.records).context("Failed to serialize translated articles")?;
        FileManager::write_atomic(&output_path, &json)
            .with_context(|| format!("Failed to write output file {:?}", output_path))?;
        info!("Success: {:?}", output_path);

        if report.stats.has_fallbacks() {
            warn!(
                "{} of {} chunks kept their original text; consider a rerun with a longer cooldown",
                report.stats.fallback_chunks,
                report.stats.total_chunks
            );
        }

        if let Err(e) = sink.remove() {
            warn!("Could not remove progress file {:?}: {}", sink.path(), e);
        }

        self.write_run_log(&input_file, &output_path, &report);

        Ok(RunOutcome::Completed { output_path, report })
    }

    /// Start from scratch, or from a matching checkpoint when resuming
    fn initial_progress(
        &self,
        sink: &JsonFileCheckpoint,
        collection: &ArticleCollection,
        fingerprint: Option<&str>,
        options: &PipelineOptions,
        resume: bool,
    ) -> RunProgress {
        if !resume {
            if FileManager::file_exists(sink.path()) {
                info!("Existing progress file {:?} will be overwritten (use --resume to continue it)", sink.path());
            }
            return RunProgress::new();
        }

        match sink.load() {
            Ok(Some(snapshot)) => {
                if !snapshot.matches_run(fingerprint, &options.source_language, &options.target_language) {
                    warn!("Progress file {:?} belongs to a different input or language pair, starting over", sink.path());
                    return RunProgress::new();
                }
                let progress = RunProgress::resume(snapshot.records, &collection.articles);
                if !progress.is_empty() {
                    info!("Resuming: {} of {} articles already translated", progress.len(), collection.len());
                }
                progress
            }
            Ok(None) => {
                debug!("No progress file at {:?}, starting from the first article", sink.path());
                RunProgress::new()
            }
            Err(e) => {
                error!("Ignoring unreadable progress file: {}", e);
                RunProgress::new()
            }
        }
    }

    fn create_progress_bar(total: usize, done: usize) -> ProgressBar {
        let progress_bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} articles ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_position(done as u64);
        progress_bar.set_message("Translating");
        progress_bar
    }

    fn update_progress_bar(bar: &ProgressBar, event: &PipelineEvent) {
        match event {
            PipelineEvent::ArticleStarted { title, .. } => {
                let short: String = title.chars().take(40).collect();
                bar.set_message(short);
            }
            PipelineEvent::RateLimited { cooldown, .. } => {
                bar.set_message(format!("Rate limited, cooling down {}", format_duration(*cooldown)));
            }
            PipelineEvent::ArticleFinished { .. } => bar.inc(1),
            PipelineEvent::Cancelled { .. } => bar.set_message("Cancelled"),
            _ => {}
        }
    }

    /// Append the run summary to `<stem>.<target>.log` next to the output
    fn write_run_log(&self, input_file: &Path, output_path: &Path, report: &BatchReport) {
        let log_path = output_path.with_extension("log");
        let entry = format!(
            "Input: {:?}\nOutput: {:?}\n{}\n",
            input_file,
            output_path,
            report.stats.summary()
        );
        if let Err(e) = FileManager::append_to_log_file(&log_path, &entry) {
            warn!("Could not write run log {:?}: {:#}", log_path, e);
        }
    }
}
