//! Prompt templates for schema inference.
//!
//! Every builder here is a pure function: identical inputs produce
//! identical prompt text. The instruction block shared by the generation
//! templates is the contract the repair parser leans on — the model is not
//! trusted to obey it, but stating it materially raises compliance.

use crate::locate::{TableCandidate, TableReport};
use crate::schema::Schema;

/// Response-format contract appended to every generation template.
const RESPONSE_FORMAT: &str = r#"Respond with a JSON object in exactly this format:

{
  "name": "Short table name",
  "description": "One-sentence description of the table",
  "columns": [
    {
      "name": "ColumnName",
      "type": "string/int/float/date/bool/unknown",
      "description": "A short description of the column",
      "nullable": true,
      "confidence": 1.0,
      "inferred": false
    }
  ]
}

Rules:
- Use the exact header text as "name", including empty or auto-generated names. Never merge, rename, or drop a header.
- Emit one entry per header, in header order.
- When no sample data backs a type, set "confidence" below 1.0 and "inferred" to true.
- Optionally add "format" (e.g. a date pattern) and "constraints" (e.g. {"min": 0}) when the data justifies them.
- Output only the JSON object. No prose, no code fences."#;

/// System message for schema generation.
pub fn generation_system_prompt() -> &'static str {
    "You are a data extraction engine. Output only valid JSON in the requested format."
}

/// System message for schema refinement.
pub fn refinement_system_prompt() -> &'static str {
    "You are a data schema refinement assistant. Your task is to update data schemas based on user feedback."
}

/// System message for table analysis.
pub fn table_analysis_system_prompt() -> &'static str {
    "You are a data expert analyzing HTML tables to identify the most useful structured data."
}

/// Build the schema-generation prompt for a candidate, selecting the
/// template that matches its shape.
pub fn build_generation_prompt(candidate: &TableCandidate, has_sample_data: bool) -> String {
    if candidate.schema_export {
        schema_csv_prompt(candidate)
    } else if candidate.is_vertical() {
        vertical_prompt(candidate)
    } else if has_sample_data {
        row_major_prompt(candidate)
    } else {
        headers_only_prompt(candidate)
    }
}

/// Template (a): row-major table with sample rows.
fn row_major_prompt(candidate: &TableCandidate) -> String {
    format!(
        r#"I have a table with these column headers:
{headers}
{caption}
Here are some sample rows:
{rows}

Describe each column: infer its type from the sample values, write a short
description, and decide whether it may contain nulls.

{format}"#,
        headers = render_headers(&candidate.headers),
        caption = render_caption(&candidate.caption),
        rows = render_rows(&candidate.sample_rows),
        format = RESPONSE_FORMAT,
    )
}

/// Template (b): row-major table, headers only (no sample rows available).
fn headers_only_prompt(candidate: &TableCandidate) -> String {
    format!(
        r#"I have a table with these column headers and no sample data:
{headers}
{caption}
Describe each column from its name alone. Types are guesses here: set
"confidence" below 1.0 and "inferred" to true on every column.

{format}"#,
        headers = render_headers(&candidate.headers),
        caption = render_caption(&candidate.caption),
        format = RESPONSE_FORMAT,
    )
}

/// Template (c): vertical property/value table — one record described by
/// property name / value pairs.
fn vertical_prompt(candidate: &TableCandidate) -> String {
    format!(
        r#"I have a property/value table describing a single record. The
properties are the columns of the underlying dataset; each value is one
example value for that column:
{pairs}
{caption}
Describe each property as a column of the dataset, inferring its type from
the single example value.

{format}"#,
        pairs = render_property_pairs(candidate),
        caption = render_caption(&candidate.caption),
        format = RESPONSE_FORMAT,
    )
}

/// Template (d): structured schema CSV — every row already defines one
/// column of the dataset.
fn schema_csv_prompt(candidate: &TableCandidate) -> String {
    format!(
        r#"I have a CSV export of a database schema. Each entry below defines one
column of the dataset as property/value pairs:

{definitions}
Produce the schema of the dataset these entries describe: one output column
per entry, carrying over the stated name, type, and nullability where given.

{format}"#,
        definitions = render_definitions(candidate),
        format = RESPONSE_FORMAT,
    )
}

/// Build the refinement prompt embedding the current schema and feedback.
pub fn build_refinement_prompt(schema: &Schema, feedback: &str) -> String {
    format!(
        r#"Below is the current data schema generated for a table:

{schema}

The user has provided the following feedback:

"{feedback}"

Refine and improve the schema based on the feedback. Keep the same JSON
structure and format, and keep every column the feedback does not ask to
change. Ensure the output parses as JSON. Return ONLY the updated schema
JSON without any explanations or additional text."#,
        schema = schema.to_json(),
        feedback = feedback,
    )
}

/// Build the prompt asking which located table is the main content table.
pub fn build_table_analysis_prompt(report: &TableReport) -> String {
    let mut descriptions = String::new();
    for table in &report.tables {
        let mut shown: Vec<&str> = table.headers.iter().take(10).map(String::as_str).collect();
        let truncated = table.headers.len() > 10;
        if shown.is_empty() {
            shown.push("(no headers)");
        }
        descriptions.push_str(&format!(
            "Table {}:\nCaption/Context: {}\nColumns ({}): {}{}\nRows: {}\n",
            table.table_id + 1,
            if table.caption.is_empty() {
                "None"
            } else {
                table.caption.as_str()
            },
            table.column_count,
            shown.join(", "),
            if truncated { "..." } else { "" },
            table.row_count,
        ));
        if let Some(first_row) = table.sample_data.first() {
            descriptions.push_str(&format!("Sample data (first row): {:?}\n", first_row));
        }
        descriptions.push('\n');
    }

    format!(
        r#"You are analyzing tables extracted from a page to find the one that
contains the most useful structured data. The page contains {count} tables.

Here are the details of each table:

{descriptions}
Identify the most likely main table by number and explain your reasoning in
2-3 sentences.

Provide your response in this format:
Main Table: [table number]
Reasoning: [your reasoning]
Table Type: [data/schema/list/other]"#,
        count = report.tables_count,
        descriptions = descriptions,
    )
}

fn render_headers(headers: &[String]) -> String {
    serde_json::to_string(headers).unwrap_or_else(|_| format!("{:?}", headers))
}

fn render_caption(caption: &str) -> String {
    if caption.is_empty() {
        String::new()
    } else {
        format!("\nTable context: {}\n", caption)
    }
}

fn render_rows(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| serde_json::to_string(row).unwrap_or_else(|_| format!("{:?}", row)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_property_pairs(candidate: &TableCandidate) -> String {
    let values = candidate.sample_rows.first();
    candidate
        .headers
        .iter()
        .enumerate()
        .map(|(i, property)| {
            let value = values
                .and_then(|row| row.get(i))
                .map(String::as_str)
                .unwrap_or("");
            format!("{}: {}", property, value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_definitions(candidate: &TableCandidate) -> String {
    let mut out = String::new();
    for (i, row) in candidate.sample_rows.iter().enumerate() {
        out.push_str(&format!("Column definition {}:\n", i + 1));
        for (j, property) in candidate.headers.iter().enumerate() {
            let value = row.get(j).map(String::as_str).unwrap_or("");
            out.push_str(&format!("  {}: {}\n", property, value));
        }
        out.push('\n');
    }
    out
}
