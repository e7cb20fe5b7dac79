//! Error types for the schemagen library.

use thiserror::Error;

/// Main error type for schemagen operations.
#[derive(Debug, Error)]
pub enum SchemaGenError {
    /// Input exceeds the configured size cap; rejected before parsing.
    #[error("Input too large: {size} bytes exceeds the {limit} byte limit")]
    OversizedInput { size: u64, limit: u64 },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by the inference provider (network, auth, timeout).
    #[error("Provider error: {0}")]
    Provider(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for schemagen operations.
pub type Result<T> = std::result::Result<T, SchemaGenError>;
