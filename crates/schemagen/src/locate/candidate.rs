//! Normalized table candidates and the selection hand-off report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a detected region maps its cells onto columns and records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Header row names the columns; subsequent rows are records.
    RowMajor,
    /// Two-column layout where column 1 holds property names and column 2
    /// holds a single record's values. Headers are the property names and
    /// the one synthetic sample row holds the values.
    VerticalPropertyValue,
}

/// One detected tabular region, normalized to headers plus sample rows.
///
/// Constructed once per region by a locator and never mutated afterwards.
/// Rows are not reshaped to header length here; that reconciliation is the
/// consumer's job.
#[derive(Debug, Clone)]
pub struct TableCandidate {
    /// Column names in encounter order, duplicates suffixed (`Name`, `Name_1`).
    pub headers: Vec<String>,
    /// Sample rows aligned positionally to `headers` where possible.
    pub sample_rows: Vec<Vec<String>>,
    /// Nearest preceding heading or caption text; empty if none.
    pub caption: String,
    /// Row/column interpretation of the region.
    pub orientation: Orientation,
    /// True when the source was a CSV recognized as a database-schema
    /// export, where each row defines one column rather than one record.
    pub schema_export: bool,
}

impl TableCandidate {
    /// Number of columns (always equal to the header count).
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Number of sample rows.
    pub fn row_count(&self) -> usize {
        self.sample_rows.len()
    }

    /// Whether the region uses the vertical property/value layout.
    pub fn is_vertical(&self) -> bool {
        matches!(self.orientation, Orientation::VerticalPropertyValue)
    }

    /// Whether any sample data backs this candidate.
    pub fn has_sample_data(&self) -> bool {
        self.sample_rows.iter().any(|row| !row.is_empty())
    }
}

/// Status sentinel surfaced alongside located candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateStatus {
    Success,
    NoTablesFound,
    Error(String),
}

impl LocateStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, LocateStatus::Success)
    }
}

impl fmt::Display for LocateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocateStatus::Success => write!(f, "Success"),
            LocateStatus::NoTablesFound => write!(f, "No tables found"),
            LocateStatus::Error(cause) => write!(f, "Error: {}", cause),
        }
    }
}

/// Outcome of a locate call: status plus candidates in document order.
#[derive(Debug, Clone)]
pub struct LocateResult {
    pub status: LocateStatus,
    pub candidates: Vec<TableCandidate>,
}

impl LocateResult {
    /// An empty result carrying only a status sentinel.
    pub fn empty(status: LocateStatus) -> Self {
        Self {
            status,
            candidates: Vec::new(),
        }
    }

    /// Build the serializable hand-off document for table selection.
    pub fn report(&self) -> TableReport {
        TableReport {
            status: self.status.to_string(),
            tables_count: self.candidates.len(),
            tables: self
                .candidates
                .iter()
                .enumerate()
                .map(|(i, candidate)| TableSummary {
                    table_id: i,
                    caption: candidate.caption.clone(),
                    column_count: candidate.column_count(),
                    row_count: candidate.row_count(),
                    headers: candidate.headers.clone(),
                    sample_data: candidate.sample_rows.clone(),
                    is_vertical_structure: candidate.is_vertical(),
                })
                .collect(),
        }
    }
}

/// Wire document handed to the table-selection surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub status: String,
    pub tables_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableSummary>,
}

/// Summary of one candidate table in a [`TableReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub table_id: usize,
    pub caption: String,
    pub column_count: usize,
    pub row_count: usize,
    pub headers: Vec<String>,
    pub sample_data: Vec<Vec<String>>,
    pub is_vertical_structure: bool,
}

/// Disambiguate repeated headers by suffixing the 2nd+ occurrence with a
/// numeric counter: `["A", "A", "B"]` becomes `["A", "A_1", "B"]`.
pub(crate) fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            let count = seen.entry(header.clone()).or_insert(0);
            let deduped = if *count == 0 {
                header.clone()
            } else {
                format!("{}_{}", header, count)
            };
            *count += 1;
            deduped
        })
        .collect()
}
