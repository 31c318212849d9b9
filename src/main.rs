// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use chunkwise::app_config::{Config, LogLevel};
use chunkwise::app_controller::Controller;
use chunkwise::document::WriteMode;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a text document (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for chunkwise
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct TranslateArgs {
    /// Plain-text document to translate
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output file (default: <input>.<language>.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(short, long)]
    endpoint: Option<String>,

    /// API key for the service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Extra rules for the model (tone, glossary, ...)
    #[arg(long)]
    prompt: Option<String>,

    /// Token budget of a chunk, context included
    #[arg(long)]
    max_chunk_tokens: Option<usize>,

    /// Number of chunks translated at once
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Keep the source paragraphs or replace them
    #[arg(short, long, value_enum)]
    write_mode: Option<WriteMode>,

    /// Do not read or write the translation cache
    #[arg(long)]
    no_cache: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// chunkwise - chunked document translation with LLMs
///
/// Splits a document into token-bounded chunks with surrounding context,
/// translates them concurrently and writes the result in document order.
#[derive(Parser, Debug)]
#[command(name = "chunkwise")]
#[command(version)]
#[command(about = "Chunked document translation with LLMs")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "chunkwise splits a document into token-bounded chunks, translates them with an \
OpenAI-compatible chat model and writes the translation back in document order.

EXAMPLES:
    chunkwise book.txt                          # Translate using default config
    chunkwise -f -t de book.txt                 # Translate to German, overwrite output
    chunkwise -w replace -o out.txt book.txt    # Replace source paragraphs
    chunkwise -e http://localhost:1234/v1 -m local book.txt
    chunkwise completions bash > chunkwise.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: Option<TranslateArgs>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and emoji for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, emoji) = Self::decoration(record.level());
        let _ = writeln!(std::io::stderr(), "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match (cli.command, cli.translate) {
        (Some(Commands::Completions { shell }), _) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "chunkwise", &mut std::io::stdout());
            Ok(())
        }
        (Some(Commands::Translate(args)), _) | (None, Some(args)) => {
            let result = run_translate(args).await;
            if let Err(e) = &result {
                error!("{:#}", e);
            }
            result
        }
        (None, None) => Err(anyhow!("INPUT_PATH is required when no subcommand is specified")),
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // A log level given on the command line applies before the config is read
    if let Some(level) = options.log_level {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    match controller
        .run(options.input_path.clone(), options.output.clone(), options.force_overwrite)
        .await?
    {
        Some(path) => info!("Translation written to {}", path.display()),
        None => info!("Nothing to do for {}", options.input_path.display()),
    }
    Ok(())
}

/// Command line values take precedence over the configuration file
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(model) = &options.model {
        config.provider.model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.provider.endpoint = endpoint.clone();
    }
    if let Some(api_key) = &options.api_key {
        if config.provider.api_key.is_empty() {
            config.provider.api_key = api_key.clone();
        }
    }
    if let Some(prompt) = &options.prompt {
        config.translation.user_prompt = Some(prompt.clone());
    }
    if let Some(max_chunk_tokens) = options.max_chunk_tokens {
        config.translation.max_chunk_tokens = max_chunk_tokens;
    }
    if let Some(concurrency) = options.concurrency {
        config.translation.concurrent_requests = concurrency;
    }
    if let Some(write_mode) = options.write_mode {
        config.translation.write_mode = write_mode;
    }
    if options.no_cache {
        config.translation.cache_enabled = false;
    }
    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }
}
