//! Table-level schema and wire-document conversion.

use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::SchemaGenError;

use super::column::SchemaColumn;

/// Output format for a serialized schema. `Text` is byte-identical to
/// pretty-printed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Text,
}

impl FromStr for OutputFormat {
    type Err = SchemaGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(SchemaGenError::Config(format!(
                "Unsupported format type: {}",
                other
            ))),
        }
    }
}

/// A complete inferred schema.
///
/// Refinement never mutates a schema in place: each round produces a new
/// value so the prior version stays inspectable.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Table-level name.
    pub name: String,
    /// Table-level description.
    pub description: String,
    /// Columns in the order they were presented to the inference capability.
    pub columns: Vec<SchemaColumn>,
    /// Provenance: source url/file, table index, refinement count, flags.
    pub metadata: IndexMap<String, Value>,
    /// Last-call metrics, when recorded.
    pub metrics: IndexMap<String, Value>,
}

impl Schema {
    /// Create an empty schema with the given name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            columns: Vec::new(),
            metadata: IndexMap::new(),
            metrics: IndexMap::new(),
        }
    }

    /// Coerce an untrusted document into a schema, synthesizing defaults
    /// for every absent field. This is the only place untrusted data
    /// becomes a `Schema`.
    ///
    /// Accepts `columns` or the legacy `schema` key for the column array.
    pub fn from_document(doc: &Value, has_sample_data: bool) -> Self {
        let empty = Map::new();
        let object = doc.as_object().unwrap_or(&empty);

        let columns = object
            .get("columns")
            .or_else(|| object.get("schema"))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| SchemaColumn::from_document(entry, i, has_sample_data))
                    .collect()
            })
            .unwrap_or_default();

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Table Schema")
            .to_string();
        let description = object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let metadata = object
            .get("metadata")
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        let metrics = object
            .get("metrics")
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Self {
            name,
            description,
            columns,
            metadata,
            metrics,
        }
    }

    /// Convert to the wire document: `name`, `description` and `columns`
    /// always present, `metadata` only when non-empty.
    pub fn to_document(&self) -> Value {
        let mut object = Map::new();
        object.insert("name".to_string(), json!(self.name));
        object.insert("description".to_string(), json!(self.description));
        object.insert(
            "columns".to_string(),
            Value::Array(self.columns.iter().map(SchemaColumn::to_document).collect()),
        );
        if !self.metadata.is_empty() {
            let metadata: Map<String, Value> = self
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            object.insert("metadata".to_string(), Value::Object(metadata));
        }
        Value::Object(object)
    }

    /// Pretty-printed JSON rendition of the wire document.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_document()).unwrap_or_else(|_| "{}".to_string())
    }

    /// YAML rendition of the wire document.
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.to_document()).unwrap_or_default()
    }

    /// Render in the requested output format.
    pub fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json | OutputFormat::Text => self.to_json(),
            OutputFormat::Yaml => self.to_yaml(),
        }
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Current refinement round, 0 for a freshly generated schema.
    pub fn refinement_version(&self) -> u64 {
        self.metadata
            .get("refinement_version")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        let mut schema = Schema::new("People", "A table of people");
        let mut name = SchemaColumn::new("Name");
        name.description = "person name".to_string();
        name.nullable = false;
        let mut age = SchemaColumn::new("Age");
        age.data_type = "int".to_string();
        age.nullable = false;
        schema.columns = vec![name, age];
        schema
    }

    #[test]
    fn test_from_document_columns_key() {
        let doc = json!({
            "name": "People",
            "description": "",
            "columns": [
                {"name": "Name", "type": "string"},
                {"name": "Age", "type": "int"}
            ]
        });

        let schema = Schema::from_document(&doc, true);
        assert_eq!(schema.column_count(), 2);
        assert_eq!(schema.columns[1].data_type, "int");
    }

    #[test]
    fn test_from_document_legacy_schema_key() {
        let doc = json!({
            "schema": [
                {"column_name": "a", "type": "string", "description": "first"}
            ]
        });

        let schema = Schema::from_document(&doc, true);
        assert_eq!(schema.name, "Table Schema");
        assert_eq!(schema.columns[0].name, "a");
        assert_eq!(schema.columns[0].description, "first");
    }

    #[test]
    fn test_from_document_no_columns() {
        let schema = Schema::from_document(&json!({"name": "Empty"}), true);
        assert_eq!(schema.name, "Empty");
        assert!(schema.columns.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_columns() {
        let schema = sample_schema();
        let restored = Schema::from_document(&schema.to_document(), true);

        assert_eq!(restored.column_count(), schema.column_count());
        for (restored_col, original_col) in restored.columns.iter().zip(schema.columns.iter()) {
            assert_eq!(restored_col.name, original_col.name);
            assert_eq!(restored_col.data_type, original_col.data_type);
        }
        assert_eq!(restored, schema);
    }

    #[test]
    fn test_metadata_serialized_only_when_present() {
        let mut schema = sample_schema();
        assert!(schema.to_document().get("metadata").is_none());

        schema
            .metadata
            .insert("source_url".to_string(), json!("https://example.com"));
        let doc = schema.to_document();
        assert_eq!(doc["metadata"]["source_url"], "https://example.com");
    }

    #[test]
    fn test_text_format_identical_to_json() {
        let schema = sample_schema();
        assert_eq!(schema.format(OutputFormat::Text), schema.format(OutputFormat::Json));
    }

    #[test]
    fn test_yaml_format() {
        let yaml = sample_schema().format(OutputFormat::Yaml);
        assert!(yaml.contains("name: People"));
        assert!(yaml.contains("columns:"));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_column_order_stable() {
        let schema = sample_schema();
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Age"]);

        let restored = Schema::from_document(&schema.to_document(), true);
        let restored_names: Vec<&str> =
            restored.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(restored_names, names);
    }
}
