//! Error types for the host layer (spec loading, config discovery, CLI).
//!
//! The review and fix engines never return these: rule failures are isolated
//! per element and fix failures are reported as data in the change log.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading specs or configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is not valid YAML: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no spec files matched {0}")]
    NoMatch(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to serialize output: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, Error>;
