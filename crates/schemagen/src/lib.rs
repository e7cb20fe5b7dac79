//! Schemagen: LLM-assisted schema inference for semi-structured tables.
//!
//! Schemagen locates tabular regions inside arbitrary HTML or CSV input,
//! asks a language model to describe each column, and repairs the model's
//! free-text reply into a validated schema a human can iteratively refine.
//!
//! # Core Principles
//!
//! - **Never crash on untrusted input**: malformed markup and garbled model
//!   output degrade to an empty or low-confidence schema, not an error.
//! - **One coercion boundary**: untrusted documents become [`Schema`] values
//!   in exactly one place; everything downstream trusts the value.
//! - **Refinement is non-destructive**: every feedback round produces a new
//!   schema while the prior one stays inspectable.
//!
//! # Example
//!
//! ```no_run
//! use schemagen::{OpenAIProvider, SchemaConverter};
//!
//! let provider = OpenAIProvider::from_env().unwrap();
//! let mut converter = SchemaConverter::new(provider);
//!
//! let html = std::fs::read("listing.html").unwrap();
//! let located = converter.locate_tables(&html);
//! let schema = converter.generate_schema(&located.candidates[0]);
//!
//! println!("{}", schema.to_json());
//! ```

pub mod config;
pub mod converter;
pub mod error;
pub mod llm;
pub mod locate;
pub mod metrics;
pub mod refine;
pub mod repair;
pub mod schema;

pub use config::{LlmConfig, LocatorConfig};
pub use converter::{SchemaConverter, SchemaSource};
pub use error::{Result, SchemaGenError};
pub use llm::{Generation, LlmProvider, MockProvider, OpenAIProvider, TokenUsage};
pub use locate::{
    CsvLocator, HtmlLocator, LocateResult, LocateStatus, Orientation, TableCandidate, TableReport,
    TableSummary,
};
pub use metrics::{MetricsLedger, MetricsReport, MetricsSample, Phase, PhaseSummary};
pub use refine::{RefinementEngine, RefinementOutcome};
pub use schema::{OutputFormat, Schema, SchemaColumn};
