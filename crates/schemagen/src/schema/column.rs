//! Column-level schema representation.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Type tag assumed when the document does not state one.
pub(crate) const DEFAULT_TYPE: &str = "string";

/// One inferred column.
///
/// `name` is authoritative once headers are known: an empty string is a
/// legitimate name and is never replaced. The `Column_<n>` placeholder is
/// used only when the document carried no name key at all.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaColumn {
    /// Column name, exactly as provided by the source.
    pub name: String,
    /// Free-form type tag (`string`, `int`, `date`, ...); not a closed enum
    /// because the inference capability chooses it.
    pub data_type: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the column may contain nulls.
    pub nullable: bool,
    /// Confidence in the inferred type (0.0-1.0). Below 1.0 signals the
    /// type was inferred from the name alone.
    pub confidence: f64,
    /// True when no sample data backed the inference.
    pub inferred: bool,
    /// Optional value format, e.g. a date pattern.
    pub format: Option<String>,
    /// Optional constraints, e.g. min/max/pattern.
    pub constraints: IndexMap<String, Value>,
}

impl SchemaColumn {
    /// Create a column with the given name and all defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DEFAULT_TYPE.to_string(),
            description: String::new(),
            nullable: true,
            confidence: 1.0,
            inferred: false,
            format: None,
            constraints: IndexMap::new(),
        }
    }

    /// Coerce one column entry of an untrusted document, synthesizing a
    /// value for every absent field.
    ///
    /// `index` is the zero-based column position, used only for the
    /// placeholder name. `has_sample_data` drives the `inferred` default.
    pub fn from_document(doc: &Value, index: usize, has_sample_data: bool) -> Self {
        let empty = Map::new();
        let object = doc.as_object().unwrap_or(&empty);

        // "name" with legacy "column_name" fallback. Explicit empty strings
        // are preserved; the placeholder fires only when both keys are
        // absent (or null, which the wire treats as absent).
        let name = object
            .get("name")
            .or_else(|| object.get("column_name"))
            .and_then(|value| match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .unwrap_or_else(|| format!("Column_{}", index + 1));

        let data_type = object
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TYPE)
            .to_string();
        let description = object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let nullable = object
            .get("nullable")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let confidence = object
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
        let inferred = object
            .get("inferred")
            .and_then(Value::as_bool)
            .unwrap_or(!has_sample_data);
        let format = object
            .get("format")
            .and_then(Value::as_str)
            .map(str::to_string);
        let constraints = object
            .get("constraints")
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Self {
            name,
            data_type,
            description,
            nullable,
            confidence,
            inferred,
            format,
            constraints,
        }
    }

    /// Convert to the wire document. `name`, `type`, `description` and
    /// `nullable` are always present; `confidence` and `inferred` are
    /// omitted at their defaults to keep output terse.
    pub fn to_document(&self) -> Value {
        let mut object = Map::new();
        object.insert("name".to_string(), json!(self.name));
        object.insert("type".to_string(), json!(self.data_type));
        object.insert("description".to_string(), json!(self.description));
        object.insert("nullable".to_string(), json!(self.nullable));
        if self.confidence < 1.0 {
            object.insert("confidence".to_string(), json!(self.confidence));
        }
        if self.inferred {
            object.insert("inferred".to_string(), json!(true));
        }
        if let Some(ref format) = self.format {
            object.insert("format".to_string(), json!(format));
        }
        if !self.constraints.is_empty() {
            let constraints: Map<String, Value> = self
                .constraints
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            object.insert("constraints".to_string(), Value::Object(constraints));
        }
        Value::Object(object)
    }
}
