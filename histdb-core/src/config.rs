//! Loader configuration.
//!
//! The process takes no arguments; everything is fixed by `histdb.toml` in
//! the working directory, with built-in defaults when the file is absent.
//! Exactly one source strategy is configured per run.

use crate::source::{ArchiveSource, HistoricalSource, HttpQuoteApi, RemoteSource, SourceError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Which historical source this deployment uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Local per-ticker CSV archive.
    Archive { archive_dir: PathBuf },
    /// Remote quote API.
    Remote { base_url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Directory holding the `*list*.txt` symbol list files.
    pub data_dir: PathBuf,
    pub source: SourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("histdb.sqlite"),
            data_dir: PathBuf::from("data"),
            source: SourceConfig::Archive {
                archive_dir: PathBuf::from("data/archive"),
            },
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults, a malformed
    /// file is fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Construct the configured historical source.
    pub fn build_source(&self) -> Result<Box<dyn HistoricalSource>, SourceError> {
        match &self.source {
            SourceConfig::Archive { archive_dir } => Ok(Box::new(ArchiveSource::new(archive_dir))),
            SourceConfig::Remote { base_url } => {
                let api = HttpQuoteApi::new(base_url.clone())?;
                Ok(Box::new(RemoteSource::new(api)))
            }
        }
    }
}
