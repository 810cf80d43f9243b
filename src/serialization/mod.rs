//! Serialization layer
//!
//! Attribute sets persist as canonical JSON objects (keys sorted, because the
//! set is an ordered map). Deserializing yields raw attributes that still
//! have to go through [`BlockSchema::hydrate`](crate::core::BlockSchema::hydrate);
//! values the current schema does not understand are carried along untouched.

pub mod document;

use crate::core::attribute::{AttributeSet, AttributeValue, RawAttributes};

pub use document::{parse_document, serialize_document, BlockNode, Document, DocumentError, Segment};

/// Serialization errors
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// Not valid JSON
    #[error("Invalid attribute JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but not an object
    #[error("Attributes must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Serialize a hydrated attribute set
pub fn serialize(attributes: &AttributeSet) -> Result<String, SerializationError> {
    serialize_raw(attributes.as_map())
}

/// Serialize raw attributes, unknown keys included
pub fn serialize_raw(raw: &RawAttributes) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(raw)?)
}

/// Parse serialized attributes
///
/// Blank input is an empty attribute set, as for a block saved with nothing
/// but defaults.
pub fn deserialize(json: &str) -> Result<RawAttributes, SerializationError> {
    if json.trim().is_empty() {
        return Ok(RawAttributes::new());
    }
    match serde_json::from_str::<serde_json::Value>(json)? {
        serde_json::Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(key, value)| (key, AttributeValue::from(value)))
            .collect()),
        other => Err(SerializationError::NotAnObject(json_kind(&other))),
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_sorted() {
        let set: AttributeSet = [("b", 1i64), ("a", 2i64)].into_iter().collect();
        assert_eq!(serialize(&set).unwrap(), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_integers_keep_their_form() {
        let raw = deserialize(r#"{"columns":4,"ratio":0.5}"#).unwrap();
        assert_eq!(raw["columns"], AttributeValue::Integer(4));
        assert_eq!(raw["ratio"], AttributeValue::Number(0.5));
        assert_eq!(serialize_raw(&raw).unwrap(), r#"{"columns":4,"ratio":0.5}"#);
    }

    #[test]
    fn test_blank_is_empty() {
        assert!(deserialize("  ").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(matches!(deserialize("[1]"), Err(SerializationError::NotAnObject("array"))));
        assert!(matches!(deserialize("{"), Err(SerializationError::Json(_))));
    }
}
