//! Error types for Vedabot.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Vedabot operations.
#[derive(Error, Debug)]
pub enum VedabotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Failed to parse document {}: {reason}", path.display())]
    DocumentParse { path: PathBuf, reason: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Model provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Vedabot operations.
pub type Result<T> = std::result::Result<T, VedabotError>;
