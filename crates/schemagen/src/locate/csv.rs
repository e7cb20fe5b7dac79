//! CSV table detection, including database-schema-export recognition.
//!
//! Most CSV files are ordinary row-major tables. A CSV exported from a
//! schema browser instead describes one column per row ("Column Name",
//! "Data Type", ...); those are recognized heuristically and flagged so the
//! prompt layer can treat every row as a column definition rather than a
//! data record.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::LocatorConfig;

use super::candidate::{
    dedupe_headers, LocateResult, LocateStatus, Orientation, TableCandidate,
};

/// Header terms suggesting a schema-export CSV (case-insensitive substring
/// match against each header).
const SCHEMA_HEADER_TERMS: &[&str] = &[
    "key",
    "name",
    "data type",
    "null",
    "attributes",
    "references",
    "description",
];

/// Minimum number of header hits before the header-term heuristic fires.
const SCHEMA_HEADER_MIN_HITS: usize = 2;

/// Tokens that look like SQL data types, checked against the first data row.
static DATA_TYPE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(int|integer|bigint|smallint|varchar|char|text|date|datetime|timestamp|float|double|decimal|numeric|bool|boolean)\b",
    )
    .unwrap()
});

/// Locates tabular content in CSV input.
pub struct CsvLocator {
    config: LocatorConfig,
}

impl CsvLocator {
    /// Create a locator with default configuration.
    pub fn new() -> Self {
        Self {
            config: LocatorConfig::default(),
        }
    }

    /// Create a locator with custom configuration.
    pub fn with_config(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Locate the table in raw CSV bytes.
    ///
    /// Same contract as the HTML locator: never panics, never returns an
    /// error value. A CSV always yields at most one candidate.
    pub fn locate(&self, bytes: &[u8]) -> LocateResult {
        if (bytes.len() as u64) > self.config.max_input_bytes {
            return LocateResult::empty(LocateStatus::Error(format!(
                "input is {} bytes; size cap is {} bytes",
                bytes.len(),
                self.config.max_input_bytes
            )));
        }

        let rows = match self.read_rows(bytes) {
            Ok(rows) => rows,
            Err(cause) => return LocateResult::empty(LocateStatus::Error(cause)),
        };
        if rows.is_empty() {
            return LocateResult::empty(LocateStatus::NoTablesFound);
        }

        let mut rows = rows.into_iter();
        let headers = dedupe_headers(rows.next().unwrap_or_default());
        let data_rows: Vec<Vec<String>> = rows
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        let schema_export = is_schema_export(&headers, data_rows.first());
        if schema_export {
            debug!(columns = data_rows.len(), "recognized schema-export CSV");
        }
        let cap = if schema_export {
            self.config.schema_csv_rows_cap
        } else {
            self.config.sample_rows_cap
        };

        let candidate = TableCandidate {
            headers,
            sample_rows: data_rows.into_iter().take(cap).collect(),
            caption: String::new(),
            orientation: Orientation::RowMajor,
            schema_export,
        };

        LocateResult {
            status: LocateStatus::Success,
            candidates: vec![candidate],
        }
    }

    /// Read records leniently; a malformed trailing record truncates the
    /// read instead of failing the whole input.
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<Vec<String>>, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        // Header row plus the larger of the two row caps is all we ever use.
        let read_limit = 1 + self
            .config
            .sample_rows_cap
            .max(self.config.schema_csv_rows_cap);

        let mut rows = Vec::new();
        for result in reader.records().take(read_limit) {
            match result {
                Ok(record) => rows.push(record.iter().map(|s| s.to_string()).collect()),
                Err(e) if rows.is_empty() => return Err(format!("CSV parse failed: {}", e)),
                Err(e) => {
                    warn!(error = %e, "stopping CSV read at malformed record");
                    break;
                }
            }
        }
        Ok(rows)
    }
}

impl Default for CsvLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Heuristic recognition of a database-schema export: either the headers
/// carry enough schema vocabulary, or the first data row contains
/// data-type-looking tokens.
fn is_schema_export(headers: &[String], first_row: Option<&Vec<String>>) -> bool {
    let header_hits = headers
        .iter()
        .filter(|header| {
            let header = header.to_lowercase();
            SCHEMA_HEADER_TERMS.iter().any(|term| header.contains(term))
        })
        .count();
    if header_hits >= SCHEMA_HEADER_MIN_HITS {
        return true;
    }

    first_row
        .map(|row| row.iter().any(|cell| DATA_TYPE_TOKEN.is_match(cell)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(csv: &str) -> LocateResult {
        CsvLocator::new().locate(csv.as_bytes())
    }

    #[test]
    fn test_plain_csv_is_row_major() {
        let csv = "city,population\nOslo,700000\nBergen,290000\n";

        let result = locate(csv);
        assert!(result.status.is_success());
        let table = &result.candidates[0];
        assert_eq!(table.headers, vec!["city", "population"]);
        assert_eq!(table.sample_rows.len(), 2);
        assert!(!table.schema_export);
    }

    #[test]
    fn test_plain_csv_sample_cap() {
        let mut csv = String::from("v\n");
        for i in 0..20 {
            csv.push_str(&format!("{}\n", i));
        }

        let result = locate(&csv);
        assert_eq!(result.candidates[0].sample_rows.len(), 5);
    }

    #[test]
    fn test_schema_export_recognized_by_headers() {
        let csv = "Column Name,Data Type,Nullable,Description\n\
                   id,bigint,no,primary key\n\
                   email,varchar,yes,contact address\n";

        let result = locate(csv);
        let table = &result.candidates[0];
        assert!(table.schema_export);
        assert_eq!(table.sample_rows.len(), 2);
    }

    #[test]
    fn test_schema_export_recognized_by_type_tokens() {
        let csv = "a,b\nuser_id,integer\nuser_email,varchar\n";

        let result = locate(csv);
        assert!(result.candidates[0].schema_export);
    }

    #[test]
    fn test_schema_export_reads_past_sample_cap() {
        let mut csv = String::from("Column Name,Data Type\n");
        for i in 0..30 {
            csv.push_str(&format!("col_{},varchar\n", i));
        }

        let result = locate(&csv);
        let table = &result.candidates[0];
        assert!(table.schema_export);
        assert_eq!(table.sample_rows.len(), 30);
    }

    #[test]
    fn test_single_name_header_is_not_schema_export() {
        let csv = "name,age\nAnn,30\nBob,25\n";

        let result = locate(csv);
        assert!(!result.candidates[0].schema_export);
    }

    #[test]
    fn test_empty_input() {
        let result = locate("");
        assert_eq!(result.status, LocateStatus::NoTablesFound);
    }

    #[test]
    fn test_oversized_input() {
        let locator = CsvLocator::with_config(LocatorConfig {
            max_input_bytes: 4,
            ..LocatorConfig::default()
        });

        let result = locator.locate(b"a,b\n1,2\n");
        assert!(matches!(result.status, LocateStatus::Error(_)));
    }

    #[test]
    fn test_duplicate_csv_headers_deduped() {
        let csv = "x,x,y\n1,2,3\n";

        let result = locate(csv);
        assert_eq!(result.candidates[0].headers, vec!["x", "x_1", "y"]);
    }
}
