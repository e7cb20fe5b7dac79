//! Table location: finding and normalizing tabular regions in raw input.
//!
//! Locators never fail: malformed or oversized input degrades to an empty
//! result with a status sentinel rather than an error. Each detected region
//! becomes an immutable [`TableCandidate`], normalized to headers plus a
//! handful of sample rows regardless of the source markup style.

mod candidate;
mod csv;
mod html;

pub use self::candidate::{
    LocateResult, LocateStatus, Orientation, TableCandidate, TableReport, TableSummary,
};
pub use self::csv::CsvLocator;
pub use self::html::HtmlLocator;
