//! Error types for opts-core

/// Result type for opts-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in opts-core operations
///
/// Configuration gaps and remote failures are not errors: they degrade the
/// bundle and are reported through logging and [`crate::BuildReport`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote base URL could not be turned into a libraries endpoint
    #[error("Invalid remote URL {url}: {message}")]
    InvalidRemoteUrl { url: String, message: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },

    /// Remote libraries request failed
    #[error("Remote request to {url} failed: {message}")]
    RemoteRequest { url: String, message: String },

    /// Remote libraries request did not finish in time
    #[error("Remote request to {url} timed out after {seconds}s")]
    RemoteTimeout { url: String, seconds: u64 },

    // Transparent wrappers for underlying crate errors
    /// Metadata error from opts-meta
    #[error(transparent)]
    Meta(#[from] opts_meta::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
