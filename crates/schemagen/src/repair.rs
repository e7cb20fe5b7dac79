//! Staged recovery of a schema document from free-text model output.
//!
//! The inference capability is asked for bare JSON but routinely wraps it
//! in code fences, prepends prose, mangles backslash escapes, or
//! double-encodes the whole object. Each stage here is attempted only when
//! the previous one failed; exhaustion yields a canonical fallback document
//! rather than an error, so a reply can never crash the pipeline.

use serde_json::{json, Value};
use tracing::{debug, warn};

/// Name used by the canonical fallback document.
pub const FALLBACK_NAME: &str = "Table Schema";

/// Description used by the canonical fallback document.
pub const FALLBACK_DESCRIPTION: &str = "Fallback schema created due to JSON parsing issues";

/// The canonical fallback document returned when every stage fails.
pub fn fallback_document() -> Value {
    json!({
        "name": FALLBACK_NAME,
        "description": FALLBACK_DESCRIPTION,
        "columns": []
    })
}

/// Attempt to recover a schema document, reporting failure to the caller.
///
/// Used by refinement, where a failed parse must leave the prior schema
/// untouched instead of replacing it with the fallback document.
pub fn try_parse(raw: &str) -> Option<Value> {
    let cleaned = strip_code_fences(raw);

    let mut decoded = decode_lenient(cleaned);
    if decoded.is_none() {
        decoded = brace_substring(cleaned).and_then(|inner| {
            debug!("decoding brace-delimited substring of reply");
            decode_lenient(inner)
        });
    }

    let mut value = decoded?;
    if let Value::String(inner) = value {
        // Double-encoded JSON: the reply was a JSON string holding the
        // actual document.
        value = decode_lenient(&inner)?;
    }

    validate_shape(value)
}

/// Recover a schema document or fall back to the canonical empty one.
/// Total: never panics, never returns an error.
pub fn parse_or_fallback(raw: &str) -> Value {
    try_parse(raw).unwrap_or_else(|| {
        warn!("reply unrecoverable after all repair stages; using fallback document");
        fallback_document()
    })
}

/// Strip leading/trailing markdown code-fence markers.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

/// Direct decode, then decode after backslash repair.
fn decode_lenient(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    serde_json::from_str(&repair_backslashes(text)).ok()
}

/// Re-escape every backslash, then restore the valid two-character escape
/// sequences the blanket re-escape just broke. A lone backslash before a
/// regular character becomes a legal `\\`; a backslash that was already
/// part of a valid escape is put back as-is.
fn repair_backslashes(text: &str) -> String {
    let mut repaired = text.replace('\\', "\\\\");
    for escaped in ["\\\\\"", "\\\\n", "\\\\t", "\\\\r", "\\\\b", "\\\\f"] {
        let restored = &escaped[1..];
        repaired = repaired.replace(escaped, restored);
    }
    repaired
}

/// The first `{` through the last `}`, tolerating commentary the model
/// added around the object despite instructions.
fn brace_substring(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Shape check: the decoded value must be an object carrying a `columns`
/// key or the legacy `schema` key; an object with only a table `name` is
/// accepted and gets an empty column list.
fn validate_shape(value: Value) -> Option<Value> {
    let object = value.as_object()?;
    if object.contains_key("columns") || object.contains_key("schema") {
        return Some(value);
    }
    if object.contains_key("name") {
        let mut patched = value;
        if let Some(object) = patched.as_object_mut() {
            object.insert("columns".to_string(), json!([]));
        }
        return Some(patched);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let value = try_parse(r#"{"name":"X","columns":[]}"#).unwrap();
        assert_eq!(value["name"], "X");
        assert!(value["columns"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_code_fenced_json() {
        let value = try_parse("```json\n{\"name\":\"X\",\"columns\":[]}\n```").unwrap();
        assert_eq!(value["name"], "X");
    }

    #[test]
    fn test_bare_fence_json() {
        let value = try_parse("```\n{\"name\":\"X\",\"columns\":[]}\n```").unwrap();
        assert_eq!(value["name"], "X");
    }

    #[test]
    fn test_garbage_returns_none() {
        assert!(try_parse("not json at all").is_none());
    }

    #[test]
    fn test_garbage_falls_back() {
        let value = parse_or_fallback("not json at all");
        assert_eq!(value["name"], FALLBACK_NAME);
        assert_eq!(value["description"], FALLBACK_DESCRIPTION);
        assert!(value["columns"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_unescaped_backslash_repaired() {
        // A Windows path with a raw backslash is invalid JSON until the
        // backslash is re-escaped.
        let raw = "{\"name\":\"C:\\Users\",\"columns\":[]}";
        assert!(serde_json::from_str::<Value>(raw).is_err());

        let value = try_parse(raw).unwrap();
        assert_eq!(value["name"], "C:\\Users");
    }

    #[test]
    fn test_valid_escapes_survive_repair() {
        // The raw backslash in C:\data forces the repair stage; the \n and
        // \" escapes must come through it unchanged.
        let raw = "{\"name\":\"line\\none\",\"columns\":[],\"description\":\"a \\\"quote\\\" and C:\\data\"}";
        let value = try_parse(raw).unwrap();
        assert_eq!(value["name"], "line\none");
        assert_eq!(value["description"], "a \"quote\" and C:\\data");
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Here is the schema you asked for:\n{\"name\":\"X\",\"columns\":[]}\nLet me know!";
        let value = try_parse(raw).unwrap();
        assert_eq!(value["name"], "X");
    }

    #[test]
    fn test_double_encoded_document() {
        let inner = r#"{"name":"X","columns":[]}"#;
        let raw = serde_json::to_string(inner).unwrap();
        let value = try_parse(&raw).unwrap();
        assert_eq!(value["name"], "X");
    }

    #[test]
    fn test_legacy_schema_key_accepted() {
        let value = try_parse(r#"{"schema":[{"column_name":"a","type":"string"}]}"#).unwrap();
        assert!(value.get("schema").is_some());
    }

    #[test]
    fn test_name_only_object_gets_empty_columns() {
        let value = try_parse(r#"{"name":"Lonely"}"#).unwrap();
        assert_eq!(value["name"], "Lonely");
        assert!(value["columns"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_object_without_usable_keys_rejected() {
        assert!(try_parse(r#"{"foo": 1}"#).is_none());
        assert!(try_parse("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_fenced_with_prose_and_bad_escapes() {
        let raw = "Sure! Here you go:\n```json\n{\"name\":\"paths\",\"columns\":[{\"name\":\"dir\",\"type\":\"string\",\"description\":\"like C:\\Windows\"}]}\n```";
        let value = try_parse(raw).unwrap();
        assert_eq!(value["columns"][0]["description"], "like C:\\Windows");
    }
}
