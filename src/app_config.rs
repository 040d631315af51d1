use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::providers::ProviderId;

/// Application configuration module
/// This module handles loading, validating and saving the configuration:
/// text limits, cache sizing, retry policy, credential storage location and
/// per-provider overrides.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Provider selected when none is given on the command line
    #[serde(default)]
    pub default_provider: Option<ProviderId>,

    /// Text and cache limits
    #[serde(default)]
    pub limits: Limits,

    /// Retry policy for remote calls
    #[serde(default)]
    pub retry: RetrySettings,

    /// Credential storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-provider overrides
    #[serde(default)]
    pub providers: Vec<ProviderOverrides>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Fixed limits shared by every adapter
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Limits {
    /// Longest text accepted for translation, in characters
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// Shortest text accepted for translation, in characters after trimming
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Entries per cache space
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Limits {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_text_length: default_max_text_length(),
            min_text_length: default_min_text_length(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Retry settings for remote calls
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetrySettings {
    /// Total attempts per remote call, the first included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff in milliseconds, doubled after every failed attempt
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

/// Where credentials are persisted
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// SQLite database path; the user data directory is used when absent
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Overrides applied on top of a provider's built-in defaults
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderOverrides {
    /// Provider these overrides apply to
    pub provider: ProviderId,

    /// Base URL of the API
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model name
    #[serde(default)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum output tokens
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling mass (0.0 to 1.0)
    #[serde(default)]
    pub top_p: Option<f32>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderOverrides {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            endpoint: None,
            model: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            timeout_secs: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_max_text_length() -> usize {
    5000
}

fn default_min_text_length() -> usize {
    1
}

fn default_cache_capacity() -> usize {
    100
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

impl Config {
    /// Load the configuration file, writing a default one when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }

        if self.limits.max_text_length == 0 {
            return Err(anyhow!("limits.max_text_length must be at least 1"));
        }

        if self.limits.min_text_length > self.limits.max_text_length {
            return Err(anyhow!(
                "limits.min_text_length ({}) exceeds limits.max_text_length ({})",
                self.limits.min_text_length,
                self.limits.max_text_length
            ));
        }

        for overrides in &self.providers {
            if let Some(endpoint) = &overrides.endpoint {
                Url::parse(endpoint)
                    .with_context(|| format!("Invalid endpoint for {}: {}", overrides.provider, endpoint))?;
            }

            if let Some(temperature) = overrides.temperature {
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(anyhow!("Temperature for {} must be between 0.0 and 2.0", overrides.provider));
                }
            }

            if let Some(top_p) = overrides.top_p {
                if !(0.0..=1.0).contains(&top_p) {
                    return Err(anyhow!("top_p for {} must be between 0.0 and 1.0", overrides.provider));
                }
            }
        }

        Ok(())
    }

    /// Overrides configured for a provider, if any
    pub fn overrides_for(&self, provider: ProviderId) -> Option<&ProviderOverrides> {
        self.providers.iter().find(|o| o.provider == provider)
    }
}
