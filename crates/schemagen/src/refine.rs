//! Feedback-driven schema refinement.
//!
//! One refinement round is one capability round-trip. A round that fails —
//! provider error or unrecoverable reply — is a no-op: the caller gets the
//! original schema back unchanged with an error indicator, never a
//! destroyed schema. A successful round produces a new schema carrying the
//! prior provenance metadata forward.

use std::time::Instant;

use serde_json::{json, Value};
use tracing::warn;

use crate::llm::{prompts, LlmProvider, TokenUsage};
use crate::repair;
use crate::schema::Schema;

/// Result of one refinement round.
#[derive(Debug)]
pub struct RefinementOutcome {
    /// The refined schema, or an unchanged copy of the input on failure.
    pub schema: Schema,
    /// Present when the round was a no-op.
    pub error: Option<String>,
    /// Token usage of the call (zero when the provider failed).
    pub token_usage: TokenUsage,
    /// Wall-clock latency of the call.
    pub latency_seconds: f64,
}

impl RefinementOutcome {
    /// Whether the feedback was incorporated.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives feedback iterations against an inference provider.
pub struct RefinementEngine<'a> {
    provider: &'a dyn LlmProvider,
}

impl<'a> RefinementEngine<'a> {
    /// Create an engine borrowing the given provider.
    pub fn new(provider: &'a dyn LlmProvider) -> Self {
        Self { provider }
    }

    /// Run one refinement round.
    pub fn refine(&self, schema: &Schema, feedback: &str) -> RefinementOutcome {
        let prompt = prompts::build_refinement_prompt(schema, feedback);

        let started = Instant::now();
        let generation = self
            .provider
            .generate(&prompt, prompts::refinement_system_prompt());
        let latency_seconds = started.elapsed().as_secs_f64();

        let generation = match generation {
            Ok(generation) => generation,
            Err(e) => {
                warn!(error = %e, "refinement provider call failed; keeping prior schema");
                return RefinementOutcome {
                    schema: schema.clone(),
                    error: Some(e.to_string()),
                    token_usage: TokenUsage::default(),
                    latency_seconds,
                };
            }
        };

        let document = match repair::try_parse(&generation.content) {
            Some(document) => document,
            None => {
                warn!("refinement reply unrecoverable; keeping prior schema");
                return RefinementOutcome {
                    schema: schema.clone(),
                    error: Some("refinement reply was not a recoverable schema document".to_string()),
                    token_usage: generation.token_usage,
                    latency_seconds,
                };
            }
        };

        let has_sample_data = schema
            .metadata
            .get("has_sample_data")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let mut refined = Schema::from_document(&document, has_sample_data);

        // Provenance survives every round: carry the prior metadata forward
        // and bump the version counter.
        let mut metadata = schema.metadata.clone();
        metadata.insert("feedback_incorporated".to_string(), json!(true));
        metadata.insert(
            "refinement_version".to_string(),
            json!(schema.refinement_version() + 1),
        );
        refined.metadata = metadata;

        refined.metrics.insert(
            "latency_seconds".to_string(),
            json!(latency_seconds),
        );
        refined.metrics.insert(
            "total_tokens".to_string(),
            json!(generation.token_usage.total_tokens),
        );
        refined
            .metrics
            .insert("model".to_string(), json!(self.provider.config().model));

        RefinementOutcome {
            schema: refined,
            error: None,
            token_usage: generation.token_usage,
            latency_seconds,
        }
    }
}
