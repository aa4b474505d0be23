//! Error types for loading show data.

use std::path::PathBuf;

/// Result type alias for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors raised while reading a data directory.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data directory could not be walked
    #[error("Failed to read data directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// The data directory does not exist or is not a directory
    #[error("Data directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    /// A file carries an extension no loader exists for
    #[error("No loader for file {path:?} with extension {extension:?}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// A file exceeds the size limit
    #[error("File {path:?} is too large: {size} bytes (limit: {limit} bytes)")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// JSON parse failure
    #[error("Unable to parse JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parse failure
    #[error("Unable to parse YAML in {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
