use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::hansard::{House, StructuralErrorPolicy};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// House whose transcripts are ingested
    #[serde(default)]
    pub house: House,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Storage configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct StorageConfig {
    /// SQLite database file; the platform data directory is used when unset
    #[serde(default)]
    pub database_path: Option<String>,
}

impl StorageConfig {
    /// Resolved database path
    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => crate::database::DatabaseConnection::default_database_path(),
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IngestConfig {
    // @field: Transcript file name prefix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    // @field: Transcript file extension, without the dot
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Skip documents whose content hash was already ingested
    #[serde(default = "default_true")]
    pub skip_unchanged: bool,

    /// What to do with a structurally broken speech
    #[serde(default)]
    pub on_structural_error: StructuralErrorPolicy,

    /// Buffered events per subscriber before the slowest one lags
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            skip_unchanged: default_true(),
            on_structural_error: StructuralErrorPolicy::default(),
            event_capacity: default_event_capacity(),
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

fn default_file_prefix() -> String {
    "hansard-".to_string()
}

fn default_file_extension() -> String {
    "xml".to_string()
}

fn default_event_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration file, writing a default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).context(format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config =
                serde_json::from_reader(reader).context(format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json).context(format!("Failed to write default config to file: {:?}", path))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.ingest.file_extension.trim().is_empty() {
            return Err(anyhow!("Transcript file extension cannot be empty"));
        }
        if self.ingest.file_extension.starts_with('.') {
            return Err(anyhow!(
                "Transcript file extension should not start with a dot: {}",
                self.ingest.file_extension
            ));
        }
        if self.ingest.event_capacity == 0 {
            return Err(anyhow!("Event capacity must be greater than zero"));
        }
        if let Some(path) = &self.storage.database_path {
            if path.trim().is_empty() {
                return Err(anyhow!("Database path cannot be empty when set"));
            }
        }
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            house: House::default(),
            storage: StorageConfig::default(),
            ingest: IngestConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
