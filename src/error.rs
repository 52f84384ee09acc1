//! Error handling for the macro registry
//!
//! Registry operations themselves are lenient: unreadable definition
//! sources are logged and skipped. These types describe the failures a
//! caller can still observe, such as reading a single source directly or
//! loading configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the registry layer
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read definition source {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
