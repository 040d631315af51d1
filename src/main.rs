// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use lingobridge::app_config::{Config, LogLevel};
use lingobridge::errors::{RateLimitWindow, TranslateError};
use lingobridge::providers::{registry, ProviderId, ReqwestTransport};
use lingobridge::storage::SqliteStore;
use lingobridge::translation::ProviderManager;

/// CLI Wrapper for ProviderId to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliProvider {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    Claude,
}

impl From<CliProvider> for ProviderId {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::Gemini => ProviderId::Gemini,
            CliProvider::OpenAI => ProviderId::OpenAI,
            CliProvider::Claude => ProviderId::Claude,
        }
    }
}

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
    /// List the supported translation providers
    Providers,

    /// Translate a text
    Translate {
        /// Text to translate
        text: String,

        /// Target language code (e.g., 'tr', 'de', 'ja')
        #[arg(short, long)]
        to: String,

        /// Source language code; detected when omitted
        #[arg(short, long)]
        from: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect the language of a text
    Detect {
        /// Text to inspect
        text: String,
    },

    /// Store the API key of a provider
    SetKey {
        /// Provider the key belongs to
        #[arg(value_enum)]
        provider: CliProvider,

        /// API key; an empty string removes the stored key
        key: String,
    },

    /// Check whether a provider is configured
    Status {
        /// Provider to check (defaults to the active one)
        #[arg(value_enum)]
        provider: Option<CliProvider>,
    },

    /// List the languages a provider supports
    Languages,

    /// Show the active provider and its configuration
    Info,

    /// Generate shell completions for lingobridge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// LingoBridge - translate text through LLM provider APIs
#[derive(Parser, Debug)]
#[command(name = "lingobridge")]
#[command(version)]
#[command(about = "Translate text and detect languages with Gemini, OpenAI or Claude")]
#[command(long_about = "LingoBridge sends text to a language-model provider and returns its translation.

EXAMPLES:
    lingobridge set-key gemini AIza...            # Store a Gemini API key
    lingobridge translate \"Hello\" --to tr         # Translate with the default provider
    lingobridge -p claude translate \"Hallo\" -t en # Use a specific provider
    lingobridge detect \"Bonjour tout le monde\"    # Detect a language
    lingobridge status openai                     # Check a provider's configuration
    lingobridge completions bash > lingobridge.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. API keys are stored in a SQLite database under
    the user's data directory unless storage.database_path is set.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliProvider>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
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

    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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

            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
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
    // Trace is the ceiling; the effective level is set once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "lingobridge", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level.into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let provider = cli
        .provider
        .map(ProviderId::from)
        .or(config.default_provider)
        .unwrap_or(ProviderId::Gemini);

    let database_path = match &config.storage.database_path {
        Some(path) => path.clone(),
        None => SqliteStore::default_database_path()?,
    };
    debug!("Using credential store at {:?}", database_path);
    let store = SqliteStore::new(&database_path)
        .with_context(|| format!("Failed to open credential store: {:?}", database_path))?;

    let manager = ProviderManager::from_config(&config, Arc::new(store), Arc::new(ReqwestTransport::default()));

    run_command(&manager, provider, cli.command).await
}

async fn run_command(manager: &ProviderManager, provider: ProviderId, command: Commands) -> Result<()> {
    match command {
        Commands::Providers => {
            for descriptor in registry() {
                let marker = if descriptor.id == provider { "*" } else { " " };
                println!(
                    "{} {:<8} {:<18} {} (default model: {})",
                    marker, descriptor.id.as_str(), descriptor.name, descriptor.description, descriptor.default_model
                );
            }
        }
        Commands::Translate { text, to, from, json } => {
            manager.switch_api(provider.as_str()).await.map_err(user_error)?;
            let result = manager
                .translate_text(&text, &to, from.as_deref())
                .await
                .map_err(user_error)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                debug!(
                    "{} -> {} (confidence {:.1})",
                    result.source_language.code, result.target_language.code, result.confidence
                );
                println!("{}", result.translated_text);
            }
        }
        Commands::Detect { text } => {
            manager.switch_api(provider.as_str()).await.map_err(user_error)?;
            let language = manager.detect_language(&text).await.map_err(user_error)?;
            println!("{} ({}, {})", language.code, language.name, language.native_name);
        }
        Commands::SetKey { provider, key } => {
            let provider = ProviderId::from(provider);
            manager.set_api_key(provider.as_str(), &key).await.map_err(user_error)?;
            let status = manager.check_api_status(Some(provider.as_str())).await;
            println!("{}: {}", provider, status.message);
        }
        Commands::Status { provider: target } => {
            let target = target.map(ProviderId::from).unwrap_or(provider);
            let status = manager.check_api_status(Some(target.as_str())).await;
            println!("{}", serde_json::to_string_pretty(&status)?);
            if !status.is_healthy() {
                return Err(anyhow!("{} is not ready", target));
            }
        }
        Commands::Languages => {
            for language in manager.supported_languages(Some(provider.as_str())).await {
                println!("{:<4} {:<12} {}", language.code, language.name, language.native_name);
            }
        }
        Commands::Info => {
            manager.switch_api(provider.as_str()).await.map_err(user_error)?;
            let info = manager
                .current_api_info()
                .ok_or_else(|| user_error(TranslateError::NoProviderSelected))?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Turn a translation error into the message shown on the terminal
fn user_error(error: TranslateError) -> anyhow::Error {
    let hint = match error.rate_limit_window() {
        Some(RateLimitWindow::Daily) => {
            Some("The daily request limit of this provider is used up. Try again tomorrow or switch provider.")
        }
        Some(RateLimitWindow::Hourly) => {
            Some("The hourly request limit of this provider is used up. Try again within the hour.")
        }
        Some(_) => Some("The provider is rate limiting requests. Wait a moment and try again."),
        None => None,
    };

    match hint {
        Some(hint) => anyhow!("{}\n{}", hint, error),
        None => anyhow!(error),
    }
}
