//! LLM provider trait and exchange types.

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::Result;

/// Token accounting for one inference call. Zero when the API omits usage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// One raw reply from the inference capability.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Free text returned by the model. Not trusted to be valid JSON.
    pub content: String,
    /// Token usage reported by the API.
    pub token_usage: TokenUsage,
}

/// Trait for LLM providers.
///
/// Implementations must be thread-safe (Send + Sync) so a provider can be
/// shared across independent schema-generation sessions.
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the raw reply.
    ///
    /// Errors from this boundary are equivalent to malformed output: the
    /// caller routes both through the same fallback-schema path and never
    /// lets either terminate the session.
    fn generate(&self, prompt: &str, system_message: &str) -> Result<Generation>;

    /// Get the configuration for this provider.
    fn config(&self) -> &LlmConfig;

    /// Get the name of this provider (for logging and metrics labels).
    fn name(&self) -> &str;
}
