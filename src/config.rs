//! Process configuration: built-in defaults, then an optional TOML file, then
//! command-line flags and environment.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::EmptyPagePolicy;

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_BUFFER_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Configuration error: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "product_catalog")]
#[command(about = "Product catalog service answering JSON requests on stdin")]
pub struct CliArgs {
    /// TOML file with `[database]`, `[service]` and `[logging]` tables.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Capacity of the catalog request channel.
    #[arg(long)]
    pub buffer_size: Option<usize>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Behavior when page 1 is requested from an empty catalog.
    #[arg(long, value_enum)]
    pub empty_page: Option<EmptyPagePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub database: DatabaseSection,
    pub service: ServiceSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub buffer_size: Option<usize>,
    pub empty_page: Option<EmptyPagePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub format: Option<LogFormat>,
    pub level: Option<String>,
}

impl FileConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved settings the process runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub buffer_size: usize,
    pub empty_page: EmptyPagePolicy,
    pub log_format: LogFormat,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            empty_page: EmptyPagePolicy::default(),
            log_format: LogFormat::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::merge(file, args)
    }

    /// Flags win over the file, the file wins over defaults.
    pub fn merge(file: FileConfig, args: CliArgs) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            database_url: args
                .database_url
                .or(file.database.url)
                .unwrap_or(defaults.database_url),
            buffer_size: args
                .buffer_size
                .or(file.service.buffer_size)
                .unwrap_or(defaults.buffer_size),
            empty_page: args
                .empty_page
                .or(file.service.empty_page)
                .unwrap_or(defaults.empty_page),
            log_format: args
                .log_format
                .or(file.logging.format)
                .unwrap_or(defaults.log_format),
            log_level: args
                .log_level
                .or(file.logging.level)
                .unwrap_or(defaults.log_level),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be at least 1".to_string()));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid("database url must not be empty".to_string()));
        }
        Ok(())
    }
}
