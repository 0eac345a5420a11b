//! Error types for opts-cli

use std::path::PathBuf;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from opts-core
    #[error(transparent)]
    Core(#[from] opts_core::Error),

    /// Error from opts-meta
    #[error(transparent)]
    Meta(#[from] opts_meta::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid runtime config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid compiler list {path}: {source}")]
    CompilersParse {
        path: PathBuf,
        #[source]
        source: opts_core::Error,
    },

    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}
