//! Explicit configuration for table detection and inference.
//!
//! Configuration is passed by value into the locators and the converter so
//! detection behavior is reproducible per call; there is no process-wide
//! configuration singleton.

/// Configuration for table location in HTML and CSV input.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Maximum sample rows extracted per candidate.
    pub sample_rows_cap: usize,
    /// Maximum input size in bytes, enforced before parsing.
    pub max_input_bytes: u64,
    /// Whether to fall back to elements whose class contains "table" or
    /// "grid" when no native table elements exist.
    pub detect_implicit_tables: bool,
    /// Maximum column-definition rows read from a schema-export CSV.
    pub schema_csv_rows_cap: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            sample_rows_cap: 5,
            max_input_bytes: 10 * 1024 * 1024,
            detect_implicit_tables: true,
            schema_csv_rows_cap: 50,
        }
    }
}

/// Configuration for LLM providers.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,

    /// Request timeout in seconds. Expiry is treated as an inference
    /// failure and routed through the fallback-schema path.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}
