//! Main SchemaConverter orchestrator and public API.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::LocatorConfig;
use crate::error::{Result, SchemaGenError};
use crate::llm::{prompts, LlmProvider, TokenUsage};
use crate::locate::{CsvLocator, HtmlLocator, LocateResult, TableCandidate, TableReport};
use crate::metrics::{MetricsLedger, MetricsReport, MetricsSample, Phase};
use crate::refine::{RefinementEngine, RefinementOutcome};
use crate::repair;
use crate::schema::Schema;

/// Provenance describing where a candidate table came from.
#[derive(Debug, Clone, Default)]
pub struct SchemaSource {
    pub url: Option<String>,
    pub file: Option<String>,
    pub table_index: Option<usize>,
    pub content_hash: Option<String>,
}

impl SchemaSource {
    /// Source fetched from a URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Source read from a local file.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            file: Some(name.into()),
            ..Self::default()
        }
    }

    /// Record which candidate table was selected.
    pub fn with_table_index(mut self, index: usize) -> Self {
        self.table_index = Some(index);
        self
    }

    /// Record a SHA-256 hash of the raw source content.
    pub fn with_content_hash(mut self, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        self.content_hash = Some(format!("sha256:{:x}", hasher.finalize()));
        self
    }
}

/// The main schema-generation engine.
///
/// A converter owns one session: table location, schema generation and any
/// number of refinement rounds run strictly in sequence, and every
/// inference call is recorded in the session's metrics ledger. Independent
/// sessions should each own a converter.
pub struct SchemaConverter {
    html: HtmlLocator,
    csv: CsvLocator,
    provider: Arc<dyn LlmProvider>,
    ledger: MetricsLedger,
}

impl SchemaConverter {
    /// Create a converter with default locator configuration.
    pub fn new(provider: impl LlmProvider + 'static) -> Self {
        Self::with_config(provider, LocatorConfig::default())
    }

    /// Create a converter with custom locator configuration.
    pub fn with_config(provider: impl LlmProvider + 'static, config: LocatorConfig) -> Self {
        Self {
            html: HtmlLocator::with_config(config.clone()),
            csv: CsvLocator::with_config(config),
            provider: Arc::new(provider),
            ledger: MetricsLedger::new(),
        }
    }

    /// Locate candidate tables in raw HTML. Never fails; see
    /// [`LocateResult::status`] for the outcome sentinel.
    pub fn locate_tables(&self, html: &[u8]) -> LocateResult {
        self.html.locate(html)
    }

    /// Locate the table in raw CSV bytes.
    pub fn locate_csv(&self, bytes: &[u8]) -> LocateResult {
        self.csv.locate(bytes)
    }

    /// Ask the inference capability which located table is the main
    /// content table, returning its raw recommendation text. Selection
    /// itself stays with the caller. Advisory: a provider failure is
    /// returned as an error the caller may ignore.
    pub fn analyze_tables(&mut self, report: &TableReport) -> Result<String> {
        if report.tables.is_empty() {
            return Err(SchemaGenError::EmptyData(
                "no candidate tables to analyze".to_string(),
            ));
        }

        let prompt = prompts::build_table_analysis_prompt(report);
        let started = Instant::now();
        let generation = self
            .provider
            .generate(&prompt, prompts::table_analysis_system_prompt());
        let latency_seconds = started.elapsed().as_secs_f64();

        let usage = generation
            .as_ref()
            .map(|g| g.token_usage)
            .unwrap_or_default();
        self.record(latency_seconds, usage, "table_analyzer", Phase::Initial);

        generation.map(|g| g.content)
    }

    /// Generate a schema for one candidate table.
    ///
    /// Provider failures and unrecoverable replies both degrade to the
    /// canonical fallback schema with an `error` metadata field; this
    /// method never fails.
    pub fn generate_schema(&mut self, candidate: &TableCandidate) -> Schema {
        self.generate_schema_with_source(candidate, &SchemaSource::default())
    }

    /// Generate a schema for one candidate table, annotating provenance.
    pub fn generate_schema_with_source(
        &mut self,
        candidate: &TableCandidate,
        source: &SchemaSource,
    ) -> Schema {
        let has_sample_data = candidate.has_sample_data();
        let prompt = prompts::build_generation_prompt(candidate, has_sample_data);

        let started = Instant::now();
        let generation = self
            .provider
            .generate(&prompt, prompts::generation_system_prompt());
        let latency_seconds = started.elapsed().as_secs_f64();

        let (document, error) = match &generation {
            Ok(generation) => (repair::parse_or_fallback(&generation.content), None),
            Err(e) => {
                debug!(error = %e, "inference call failed; using fallback schema");
                (repair::fallback_document(), Some(e.to_string()))
            }
        };
        let usage = generation.map(|g| g.token_usage).unwrap_or_default();

        let mut schema = Schema::from_document(&document, has_sample_data);
        self.annotate(&mut schema, candidate, source, has_sample_data, error);
        schema.metrics.insert(
            "latency_seconds".to_string(),
            json!(latency_seconds),
        );
        schema
            .metrics
            .insert("total_tokens".to_string(), json!(usage.total_tokens));
        schema
            .metrics
            .insert("model".to_string(), json!(self.provider.config().model));

        self.record(latency_seconds, usage, "schema_generator", Phase::Initial);
        schema
    }

    /// Run one feedback round against the current schema.
    ///
    /// On failure the outcome carries the original schema unchanged plus
    /// an error indicator; the session continues either way.
    pub fn refine_schema(&mut self, schema: &Schema, feedback: &str) -> RefinementOutcome {
        let engine = RefinementEngine::new(self.provider.as_ref());
        let outcome = engine.refine(schema, feedback);

        self.record(
            outcome.latency_seconds,
            outcome.token_usage,
            "schema_refiner",
            Phase::Feedback,
        );
        outcome
    }

    /// Aggregate metrics for every inference call this session made.
    pub fn metrics_report(&self) -> MetricsReport {
        self.ledger.report()
    }

    /// The session's ledger.
    pub fn ledger(&self) -> &MetricsLedger {
        &self.ledger
    }

    fn record(&mut self, latency_seconds: f64, usage: TokenUsage, label: &str, phase: Phase) {
        self.ledger.record(MetricsSample {
            latency_seconds,
            memory_delta_mb: 0.0,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            agent_label: label.to_string(),
            phase,
        });
    }

    fn annotate(
        &self,
        schema: &mut Schema,
        candidate: &TableCandidate,
        source: &SchemaSource,
        has_sample_data: bool,
        error: Option<String>,
    ) {
        if let Some(ref url) = source.url {
            schema
                .metadata
                .insert("source_url".to_string(), json!(url));
        }
        if let Some(ref file) = source.file {
            schema
                .metadata
                .insert("source_file".to_string(), json!(file));
        }
        if let Some(index) = source.table_index {
            schema
                .metadata
                .insert("table_index".to_string(), json!(index));
        }
        if let Some(ref hash) = source.content_hash {
            schema
                .metadata
                .insert("source_hash".to_string(), json!(hash));
        }
        if !candidate.caption.is_empty() {
            schema
                .metadata
                .insert("table_caption".to_string(), json!(candidate.caption));
        }
        schema.metadata.insert(
            "is_vertical_structure".to_string(),
            json!(candidate.is_vertical()),
        );
        schema
            .metadata
            .insert("has_sample_data".to_string(), json!(has_sample_data));
        schema
            .metadata
            .insert("refinement_version".to_string(), json!(0));
        schema.metadata.insert(
            "generated_at".to_string(),
            json!(Utc::now().to_rfc3339()),
        );
        if let Some(error) = error {
            schema.metadata.insert("error".to_string(), json!(error));
        }
    }
}
