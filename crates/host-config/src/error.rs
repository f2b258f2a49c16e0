//! Error types for the host configuration document

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the configuration document
///
/// Every variant is an authoring error: retrying the run with the same
/// document cannot succeed.
#[derive(Error, Debug)]
pub enum HostConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration for {entry}: {reason}")]
    InvalidEntry { entry: String, reason: String },

    #[error("Configuration for node {host} is missing IPMI address")]
    MissingIpmiAddress { host: String },

    #[error("Invalid size {value:?} for {entry}, expected a percentage such as \"50%\"")]
    InvalidSize { entry: String, value: String },
}

impl HostConfigError {
    pub(crate) fn invalid_entry(entry: &str, reason: impl Into<String>) -> Self {
        HostConfigError::InvalidEntry {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }
}
