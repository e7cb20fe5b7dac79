//! HTML table detection and normalization.
//!
//! Finds candidate tabular regions in arbitrary markup: native `<table>`
//! elements first, then (behind a config flag) div-grids whose class names
//! suggest tabular content. Headers are resolved through an ordered cascade
//! of extraction strategies; the cascade order is the de facto definition of
//! which heuristic wins and is covered by tests.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::LocatorConfig;

use super::candidate::{
    dedupe_headers, LocateResult, LocateStatus, Orientation, TableCandidate,
};

static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").unwrap());
static THEAD: Lazy<Selector> = Lazy::new(|| Selector::parse("thead").unwrap());
static CELLS: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());
static CAPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("caption").unwrap());
static DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());

/// Property names that mark a two-column row as a schema property/value
/// pair during vertical-structure detection.
const PROPERTY_VOCABULARY: &[&str] = &[
    "name",
    "type",
    "description",
    "id",
    "key",
    "column",
    "property",
    "attribute",
    "field",
    "constraint",
    "value",
    "default",
    "null",
    "nullable",
    "required",
    "format",
    "length",
    "min",
    "max",
];

/// Maximum first-cell length for a property/value indicator row.
const PROPERTY_NAME_MAX_LEN: usize = 30;

/// Data rows examined when deciding whether a table is vertical.
const VERTICAL_DETECTION_WINDOW: usize = 5;

/// One extracted row of cell text.
#[derive(Debug, Clone)]
struct Row {
    cells: Vec<String>,
    /// True when the row is made of header cells (`th`, or header-classed
    /// divs in a div-grid). Header rows never count as property/value
    /// indicators and never contribute values to a vertical candidate.
    is_header: bool,
}

/// Locates tabular regions in HTML input.
pub struct HtmlLocator {
    config: LocatorConfig,
}

/// A table-like element paired with its preceding-heading caption.
struct Region<'a> {
    element: ElementRef<'a>,
    caption: String,
}

impl HtmlLocator {
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

    /// Locate candidate tables in raw HTML bytes.
    ///
    /// Never panics and never returns an error value: oversized input and
    /// markup with no tabular content yield an empty result with the
    /// corresponding status sentinel.
    pub fn locate(&self, html: &[u8]) -> LocateResult {
        if (html.len() as u64) > self.config.max_input_bytes {
            return LocateResult::empty(LocateStatus::Error(format!(
                "input is {} bytes; size cap is {} bytes",
                html.len(),
                self.config.max_input_bytes
            )));
        }

        let text = String::from_utf8_lossy(html);
        let document = Html::parse_document(&text);

        let regions = collect_regions(&document, self.config.detect_implicit_tables);
        if regions.is_empty() {
            return LocateResult::empty(LocateStatus::NoTablesFound);
        }

        let candidates = regions
            .into_iter()
            .map(|region| self.extract_candidate(region))
            .collect();

        LocateResult {
            status: LocateStatus::Success,
            candidates,
        }
    }

    /// Normalize one region into a candidate.
    fn extract_candidate(&self, region: Region<'_>) -> TableCandidate {
        let table = region.element;
        let rows = collect_rows(table);

        let caption = if region.caption.is_empty() {
            table
                .select(&CAPTION)
                .next()
                .map(element_text)
                .unwrap_or_default()
        } else {
            region.caption
        };

        if detect_vertical(&rows) {
            debug!(rows = rows.len(), "classified table as vertical property/value");
            return vertical_candidate(&rows, caption);
        }

        let (headers, header_row_in_body) = extract_headers(table, &rows);
        let skip = if !headers.is_empty() && header_row_in_body && !rows.is_empty() {
            1
        } else {
            0
        };
        let sample_rows: Vec<Vec<String>> = rows
            .into_iter()
            .skip(skip)
            .map(|row| row.cells)
            .filter(|cells| cells.iter().any(|cell| !cell.trim().is_empty()))
            .take(self.config.sample_rows_cap)
            .collect();

        TableCandidate {
            headers: dedupe_headers(headers),
            sample_rows,
            caption,
            orientation: Orientation::RowMajor,
            schema_export: false,
        }
    }
}

impl Default for HtmlLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect table-like regions in document order, tracking the nearest
/// preceding h1/h2/h3 as each region's caption context.
fn collect_regions(document: &Html, detect_implicit: bool) -> Vec<Region<'_>> {
    let mut native = Vec::new();
    let mut implicit = Vec::new();
    let mut last_heading = String::new();

    for node in document.tree.root().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        match element.value().name() {
            "h1" | "h2" | "h3" => last_heading = element_text(element),
            "table" => native.push(Region {
                element,
                caption: last_heading.clone(),
            }),
            "div" if detect_implicit && class_contains(element, &["table", "grid"]) => {
                implicit.push(Region {
                    element,
                    caption: last_heading.clone(),
                })
            }
            _ => {}
        }
    }

    // Implicit div-grids are a fallback, not a supplement.
    if native.is_empty() { implicit } else { native }
}

/// Ordered header-extraction cascade; the first strategy yielding a
/// non-empty sequence wins. The boolean per strategy records whether the
/// header it finds occupies the first body row (and must be skipped when
/// sampling data rows).
fn extract_headers(table: ElementRef<'_>, rows: &[Row]) -> (Vec<String>, bool) {
    type Extractor = for<'a, 'b> fn(ElementRef<'a>, &'b [Row]) -> Option<Vec<String>>;
    const STRATEGIES: &[(&str, Extractor, bool)] = &[
        ("th-cells", headers_from_th, true),
        ("thead-first-row", headers_from_thead, true),
        ("first-row", headers_from_first_row, true),
        ("header-class", headers_from_header_class, false),
    ];

    for (label, extract, in_body) in STRATEGIES {
        if let Some(headers) = extract(table, rows) {
            debug!(strategy = label, count = headers.len(), "header cascade matched");
            return (headers, *in_body);
        }
    }
    (Vec::new(), false)
}

/// Strategy 1: all header cells in document order.
fn headers_from_th(table: ElementRef<'_>, _rows: &[Row]) -> Option<Vec<String>> {
    let headers: Vec<String> = table.select(&TH).map(element_text).collect();
    (!headers.is_empty()).then_some(headers)
}

/// Strategy 2: first row of the header section.
fn headers_from_thead(table: ElementRef<'_>, _rows: &[Row]) -> Option<Vec<String>> {
    let thead = table.select(&THEAD).next()?;
    let first_row = thead.select(&TR).next()?;
    let headers: Vec<String> = first_row.select(&CELLS).map(element_text).collect();
    (!headers.is_empty()).then_some(headers)
}

/// Strategy 3: first row of the table, assumed to be the header when the
/// table has at least two rows.
fn headers_from_first_row(_table: ElementRef<'_>, rows: &[Row]) -> Option<Vec<String>> {
    if rows.len() < 2 {
        return None;
    }
    rows.first()
        .map(|row| row.cells.clone())
        .filter(|cells| !cells.is_empty())
}

/// Strategy 4: elements whose class contains "header", in document order.
fn headers_from_header_class(table: ElementRef<'_>, _rows: &[Row]) -> Option<Vec<String>> {
    let headers: Vec<String> = table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| class_contains(*el, &["header"]))
        .map(element_text)
        .collect();
    (!headers.is_empty()).then_some(headers)
}

/// Collect cell text per row: native `<tr>` rows first, then div-grid rows
/// (class contains "row" with cells whose class contains "cell" or "col").
fn collect_rows(table: ElementRef<'_>) -> Vec<Row> {
    let rows: Vec<Row> = table
        .select(&TR)
        .map(|tr| Row {
            cells: tr.select(&CELLS).map(element_text).collect(),
            is_header: tr.select(&TH).next().is_some(),
        })
        .filter(|row| !row.cells.is_empty())
        .collect();
    if !rows.is_empty() {
        return rows;
    }

    table
        .select(&DIV)
        .filter(|div| class_contains(*div, &["row"]))
        .map(|row_div| Row {
            cells: row_div
                .select(&DIV)
                .filter(|div| class_contains(*div, &["cell", "col"]))
                .map(element_text)
                .collect(),
            is_header: class_contains(row_div, &["header"]),
        })
        .filter(|row| !row.cells.is_empty())
        .collect()
}

/// Whether a two-cell row looks like a schema property/value pair.
fn is_property_indicator(row: &Row) -> bool {
    if row.is_header || row.cells.len() != 2 {
        return false;
    }
    let first = row.cells[0].trim();
    if first.is_empty() || first.len() >= PROPERTY_NAME_MAX_LEN {
        return false;
    }
    if first.ends_with(':') {
        return true;
    }
    PROPERTY_VOCABULARY.contains(&first.to_lowercase().as_str())
}

/// Inspect the leading data rows and decide whether the table is a vertical
/// property/value layout (indicator rows make up at least half the window).
fn detect_vertical(rows: &[Row]) -> bool {
    let data_rows: Vec<&Row> = rows.iter().filter(|row| !row.is_header).collect();
    if data_rows.is_empty() {
        return false;
    }
    let examined = data_rows.len().min(VERTICAL_DETECTION_WINDOW);
    let indicators = data_rows[..examined]
        .iter()
        .filter(|row| is_property_indicator(row))
        .count();
    indicators * 2 >= examined
}

/// Invert a vertical table: cell 1 of every data row becomes a header
/// (colon stripped) and cell 2 contributes to the single synthetic row.
fn vertical_candidate(rows: &[Row], caption: String) -> TableCandidate {
    let mut properties = Vec::new();
    let mut values = Vec::new();
    for row in rows {
        if row.is_header || row.cells.len() < 2 {
            continue;
        }
        properties.push(row.cells[0].trim().trim_end_matches(':').trim().to_string());
        values.push(row.cells[1].clone());
    }

    TableCandidate {
        headers: dedupe_headers(properties),
        sample_rows: vec![values],
        caption,
        orientation: Orientation::VerticalPropertyValue,
        schema_export: false,
    }
}

/// Concatenated, whitespace-normalized text of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the element's class attribute contains any needle
/// (case-insensitive substring match).
fn class_contains(element: ElementRef<'_>, needles: &[&str]) -> bool {
    element
        .value()
        .attr("class")
        .map(|class| {
            let class = class.to_lowercase();
            needles.iter().any(|needle| class.contains(needle))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(html: &str) -> LocateResult {
        HtmlLocator::new().locate(html.as_bytes())
    }

    #[test]
    fn test_simple_table_with_header_row() {
        let html = r#"
            <table>
                <tr><th>Name</th><th>Age</th></tr>
                <tr><td>Ann</td><td>30</td></tr>
                <tr><td>Bob</td><td>25</td></tr>
            </table>
        "#;

        let result = locate(html);
        assert!(result.status.is_success());
        assert_eq!(result.candidates.len(), 1);

        let table = &result.candidates[0];
        assert_eq!(table.headers, vec!["Name", "Age"]);
        assert_eq!(table.sample_rows.len(), 2);
        assert_eq!(table.sample_rows[0], vec!["Ann", "30"]);
        assert_eq!(table.orientation, Orientation::RowMajor);
    }

    #[test]
    fn test_two_row_table_with_header_stays_row_major() {
        // One data row whose first cell is not property-like must not trip
        // the vertical classifier even though the window is a single row.
        let html = r#"
            <table>
                <tr><th>Name</th><th>Age</th></tr>
                <tr><td>Ann</td><td>30</td></tr>
            </table>
        "#;

        let result = locate(html);
        let table = &result.candidates[0];
        assert_eq!(table.orientation, Orientation::RowMajor);
        assert_eq!(table.headers, vec!["Name", "Age"]);
        assert_eq!(table.sample_rows, vec![vec!["Ann", "30"]]);
    }

    #[test]
    fn test_sample_rows_capped() {
        let mut html = String::from("<table><tr><th>V</th></tr>");
        for i in 0..10 {
            html.push_str(&format!("<tr><td>{}</td></tr>", i));
        }
        html.push_str("</table>");

        let result = locate(&html);
        assert_eq!(result.candidates[0].sample_rows.len(), 5);
    }

    #[test]
    fn test_header_from_thead_without_th() {
        let html = r#"
            <table>
                <thead><tr><td>Col1</td><td>Col2</td></tr></thead>
                <tbody><tr><td>a</td><td>b</td></tr></tbody>
            </table>
        "#;

        let result = locate(html);
        let table = &result.candidates[0];
        assert_eq!(table.headers, vec!["Col1", "Col2"]);
        assert_eq!(table.sample_rows, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_first_row_as_header_fallback() {
        let html = r#"
            <table>
                <tr><td>City</td><td>Country</td></tr>
                <tr><td>Oslo</td><td>Norway</td></tr>
            </table>
        "#;

        let result = locate(html);
        let table = &result.candidates[0];
        assert_eq!(table.headers, vec!["City", "Country"]);
        assert_eq!(table.sample_rows, vec![vec!["Oslo", "Norway"]]);
    }

    #[test]
    fn test_single_row_table_has_no_headers() {
        let html = "<table><tr><td>only</td><td>row</td></tr></table>";

        let result = locate(html);
        let table = &result.candidates[0];
        assert!(table.headers.is_empty());
        assert_eq!(table.sample_rows, vec![vec!["only", "row"]]);
    }

    #[test]
    fn test_duplicate_headers_deduped() {
        let html = r#"
            <table>
                <tr><th>A</th><th>A</th><th>B</th></tr>
                <tr><td>1</td><td>2</td><td>3</td></tr>
            </table>
        "#;

        let result = locate(html);
        assert_eq!(result.candidates[0].headers, vec!["A", "A_1", "B"]);
    }

    #[test]
    fn test_no_tables_found() {
        let result = locate("<p>Nothing tabular here.</p>");
        assert_eq!(result.status, LocateStatus::NoTablesFound);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_oversized_input_is_rejected_before_parsing() {
        let locator = HtmlLocator::with_config(LocatorConfig {
            max_input_bytes: 16,
            ..LocatorConfig::default()
        });

        let result = locator.locate(b"<table><tr><td>x</td></tr></table>");
        assert!(matches!(result.status, LocateStatus::Error(_)));
        assert!(result.candidates.is_empty());
        assert!(result.status.to_string().starts_with("Error: "));
    }

    #[test]
    fn test_implicit_div_grid_fallback() {
        let html = r#"
            <div class="data-grid">
                <div class="row"><div class="cell">Widget</div><div class="cell">9.99</div></div>
                <div class="row"><div class="cell">Gadget</div><div class="cell">19.99</div></div>
                <div class="row"><div class="cell">Doohickey</div><div class="cell">4.99</div></div>
            </div>
        "#;

        let result = locate(html);
        assert!(result.status.is_success());
        let table = &result.candidates[0];
        // First div row is assumed to be the header when nothing better exists.
        assert_eq!(table.headers, vec!["Widget", "9.99"]);
        assert_eq!(table.sample_rows.len(), 2);
    }

    #[test]
    fn test_implicit_detection_can_be_disabled() {
        let locator = HtmlLocator::with_config(LocatorConfig {
            detect_implicit_tables: false,
            ..LocatorConfig::default()
        });

        let html = r#"<div class="grid"><div class="row"><div class="cell">x</div></div></div>"#;
        let result = locator.locate(html.as_bytes());
        assert_eq!(result.status, LocateStatus::NoTablesFound);
    }

    #[test]
    fn test_caption_from_preceding_heading() {
        let html = r#"
            <h2>Monthly Sales</h2>
            <p>intro</p>
            <table><tr><th>Month</th></tr><tr><td>Jan</td></tr></table>
        "#;

        let result = locate(html);
        assert_eq!(result.candidates[0].caption, "Monthly Sales");
    }

    #[test]
    fn test_caption_element_when_no_heading() {
        let html = r#"
            <table>
                <caption>Inventory</caption>
                <tr><th>Item</th></tr>
                <tr><td>Bolt</td></tr>
            </table>
        "#;

        let result = locate(html);
        assert_eq!(result.candidates[0].caption, "Inventory");
    }

    #[test]
    fn test_vertical_property_value_detection() {
        let html = r#"
            <table>
                <tr><td>Name</td><td>Pikachu</td></tr>
                <tr><td>Type</td><td>Electric</td></tr>
                <tr><td>Height:</td><td>0.4m</td></tr>
                <tr><td>Weight:</td><td>6.0kg</td></tr>
                <tr><td>Trivia</td><td>Mascot of the franchise</td></tr>
            </table>
        "#;

        let result = locate(html);
        let table = &result.candidates[0];
        assert_eq!(table.orientation, Orientation::VerticalPropertyValue);
        assert_eq!(
            table.headers,
            vec!["Name", "Type", "Height", "Weight", "Trivia"]
        );
        assert_eq!(table.sample_rows.len(), 1);
        assert_eq!(table.sample_rows[0][0], "Pikachu");
        assert_eq!(table.sample_rows[0][2], "0.4m");
    }

    #[test]
    fn test_three_column_table_never_vertical() {
        let html = r#"
            <table>
                <tr><td>name</td><td>a</td><td>b</td></tr>
                <tr><td>type</td><td>c</td><td>d</td></tr>
                <tr><td>key</td><td>e</td><td>f</td></tr>
                <tr><td>id</td><td>g</td><td>h</td></tr>
                <tr><td>min</td><td>i</td><td>j</td></tr>
            </table>
        "#;

        let result = locate(html);
        assert_eq!(result.candidates[0].orientation, Orientation::RowMajor);
    }

    #[test]
    fn test_blank_rows_dropped() {
        let html = r#"
            <table>
                <tr><th>X</th></tr>
                <tr><td>  </td></tr>
                <tr><td>1</td></tr>
            </table>
        "#;

        let result = locate(html);
        assert_eq!(result.candidates[0].sample_rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_multiple_tables_in_document_order() {
        let html = r#"
            <h1>First</h1>
            <table><tr><th>A</th></tr><tr><td>1</td></tr></table>
            <h1>Second</h1>
            <table><tr><th>B</th></tr><tr><td>2</td></tr></table>
        "#;

        let result = locate(html);
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[0].caption, "First");
        assert_eq!(result.candidates[1].caption, "Second");
    }
}
