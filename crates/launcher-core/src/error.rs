//! Error types for the launcher core.
//!
//! Errors are split by concern: configuration loading, per-request image
//! loading, and settings persistence. Image load errors never escape the
//! loader worker; they are logged and recorded on the request instead.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for launcher operations.
#[derive(Error, Debug)]
pub enum LauncherError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image loading errors
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Settings store errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while resolving, fetching or decoding a single image.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The remote image service could not be reached or refused the request
    #[error("Fetch failed for {url}: {message}")]
    Fetch {
        url: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Reading or writing the on-disk image cache failed
    #[error("Cache error at {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// The worker could not drive the fetch (runtime setup, panics)
    #[error("Loader runtime error: {0}")]
    Runtime(String),
}

impl LoadError {
    pub(crate) fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Cache {
            path: path.into(),
            source,
        }
    }
}

/// Settings store and kickstart panel errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Computing a ROM checksum failed
    #[error("Checksum failed for {path}: {source}")]
    Checksum {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the settings file failed
    #[error("Failed to persist settings at {path}: {message}")]
    Persist { path: PathBuf, message: String },
}

/// Convenience type alias for launcher results.
pub type Result<T> = std::result::Result<T, LauncherError>;

/// Convenience type alias for per-request load results.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
