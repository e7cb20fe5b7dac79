//! Canonical in-memory schema representation.
//!
//! Untrusted documents become [`Schema`] values in exactly one place
//! ([`Schema::from_document`]); once a value exists it is trusted and no
//! downstream component re-validates it.

mod column;
#[allow(clippy::module_inception)]
mod schema;

pub use column::SchemaColumn;
pub use schema::{OutputFormat, Schema};
