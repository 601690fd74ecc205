// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use article_translator::app_config::{self, Config, TranslationProvider};
use article_translator::app_controller::{Controller, RunOutcome};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Google,
    #[value(name = "mymemory")]
    MyMemory,
    #[value(name = "libretranslate", alias = "libre")]
    LibreTranslate,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Google => TranslationProvider::Google,
            CliTranslationProvider::MyMemory => TranslationProvider::MyMemory,
            CliTranslationProvider::LibreTranslate => TranslationProvider::LibreTranslate,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate an article file (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for article-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct TranslateArgs {
    /// JSON file holding an array of articles
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file (default: <stem>.<target>.json next to the input)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Checkpoint file (default: <stem>.<target>.progress.json next to the input)
    #[arg(long, value_name = "PATH")]
    progress_file: Option<PathBuf>,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Source language code (e.g., 'en', 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'ko', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Largest chunk sent in one request, in characters
    #[arg(long, value_name = "N")]
    max_chars: Option<usize>,

    /// Write a checkpoint every N completed articles
    #[arg(long, value_name = "N")]
    checkpoint_every: Option<usize>,

    /// Continue from the progress file of an interrupted run
    #[arg(long)]
    resume: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Article Translator - resilient batch translation of news articles
///
/// Translates the content of every article in a JSON file through a free
/// translation backend, pacing requests and checkpointing progress.
#[derive(Parser, Debug)]
#[command(name = "article-translator")]
#[command(version)]
#[command(about = "Resilient batch translator for news articles")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "Translates the content of every article in a JSON file through a free translation backend.

EXAMPLES:
    article-translator articles.json                     # Translate using default config
    article-translator -f articles.json                  # Force overwrite existing output
    article-translator -p mymemory articles.json         # Use a specific backend
    article-translator -s en -t ja articles.json         # Translate from English to Japanese
    article-translator --resume articles.json            # Continue an interrupted run
    article-translator completions bash > at.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED BACKENDS:
    google          - Unofficial Google Translate web endpoint (default)
    mymemory        - MyMemory translation memory API
    libretranslate  - LibreTranslate server (public or self-hosted)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger with the most verbose filter; the effective level
    // is applied through log::set_max_level once config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "article-translator", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

/// Load the config file, or write a default one when it is missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::load_from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config.save_to_file(config_path)?;
    Ok(config)
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(max_chars) = options.max_chars {
        config.translation.active_provider_config_mut().max_chars_per_request = max_chars;
    }

    if let Some(every) = options.checkpoint_every {
        config.checkpoint.every_n = every;
    }

    if let Some(progress_file) = &options.progress_file {
        config.checkpoint.progress_file = Some(progress_file.clone());
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it before loading config
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let input = options
        .input
        .clone()
        .ok_or_else(|| anyhow!("INPUT is required when no subcommand is specified"))?;

    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options);

    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    match controller
        .run(input, options.output.clone(), options.force_overwrite, options.resume)
        .await
        .context("Translation run failed")?
    {
        RunOutcome::Skipped { .. } => {}
        RunOutcome::Completed { output_path, report } => {
            info!("Translated {} articles into {:?}", report.records.len(), output_path);
        }
        RunOutcome::Cancelled { progress_path, .. } => {
            info!("Progress saved to {:?}", progress_path);
        }
    }

    Ok(())
}
