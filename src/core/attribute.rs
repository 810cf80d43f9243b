//! Attribute values and types
//!
//! This module defines the value model shared by schemas, the editor state
//! controller, the serializer and the renderers. Values are JSON-compatible;
//! objects use an ordered map so that serialization and rendering are
//! deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute types a schema can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    /// String attribute
    String,
    /// Numeric attribute (integer or floating point)
    Number,
    /// Boolean attribute
    Boolean,
    /// Ordered sequence attribute
    Array,
    /// Object attribute with named fields
    Object,
}

impl AttributeType {
    /// Name used in schemas and violation messages
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Boolean => "boolean",
            AttributeType::Array => "array",
            AttributeType::Object => "object",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value
///
/// `Integer` is listed before `Number` so that integral JSON numbers load as
/// integers and keep their textual form across a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// String value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Floating point number
    Number(f64),
    /// Ordered sequence of values
    Array(Vec<AttributeValue>),
    /// Object with named fields
    Object(BTreeMap<String, AttributeValue>),
    /// Null value
    Null,
}

impl AttributeValue {
    /// Type of this value, `None` for null
    pub fn value_type(&self) -> Option<AttributeType> {
        match self {
            AttributeValue::String(_) => Some(AttributeType::String),
            AttributeValue::Boolean(_) => Some(AttributeType::Boolean),
            AttributeValue::Integer(_) | AttributeValue::Number(_) => Some(AttributeType::Number),
            AttributeValue::Array(_) => Some(AttributeType::Array),
            AttributeValue::Object(_) => Some(AttributeType::Object),
            AttributeValue::Null => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Try to convert to string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to convert to integer; floats are accepted only when integral
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to convert to array
    pub fn as_array(&self) -> Option<&Vec<AttributeValue>> {
        match self {
            AttributeValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to convert to object
    pub fn as_object(&self) -> Option<&BTreeMap<String, AttributeValue>> {
        match self {
            AttributeValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Look up a field of an object value
    pub fn field(&self, name: &str) -> Option<&AttributeValue> {
        self.as_object().and_then(|obj| obj.get(name))
    }

    /// Field as a string, empty when absent or not a string
    pub fn field_str(&self, name: &str) -> &str {
        self.field(name).and_then(AttributeValue::as_str).unwrap_or("")
    }

    /// Build an object value from key/value pairs
    pub fn object<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<AttributeValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        AttributeValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<u64> for AttributeValue {
    fn from(i: u64) -> Self {
        AttributeValue::Integer(i as i64)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(items: Vec<AttributeValue>) -> Self {
        AttributeValue::Array(items)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Integer(i),
                None => AttributeValue::Number(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => AttributeValue::String(s),
            serde_json::Value::Array(items) => {
                AttributeValue::Array(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(fields) => AttributeValue::Object(
                fields.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// Attribute set: the typed key/value state of one block instance
///
/// Sets are treated as immutable snapshots by the editor; every update goes
/// through [`AttributeSet::with`] which returns a new set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, AttributeValue>);

impl AttributeSet {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Get an attribute value
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// String attribute, empty when absent or mistyped
    pub fn str(&self, key: &str) -> &str {
        self.get(key).and_then(AttributeValue::as_str).unwrap_or("")
    }

    /// Boolean attribute, `false` when absent or mistyped
    pub fn bool(&self, key: &str) -> bool {
        self.get(key).and_then(AttributeValue::as_bool).unwrap_or(false)
    }

    /// Integer attribute
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(AttributeValue::as_integer)
    }

    /// Sequence attribute, empty slice when absent or mistyped
    pub fn items(&self, key: &str) -> &[AttributeValue] {
        self.get(key)
            .and_then(AttributeValue::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Return a copy of this set with `key` replaced
    pub fn with(&self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        let mut next = self.0.clone();
        next.insert(key.into(), value.into());
        Self(next)
    }

    /// Insert in place; used while building sets
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Check whether the set holds `key`
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate attributes in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &BTreeMap<String, AttributeValue> {
        &self.0
    }

    /// Consume into the underlying map
    pub fn into_map(self) -> BTreeMap<String, AttributeValue> {
        self.0
    }
}

impl From<BTreeMap<String, AttributeValue>> for AttributeSet {
    fn from(map: BTreeMap<String, AttributeValue>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Raw, not yet hydrated attributes as they come out of storage
pub type RawAttributes = BTreeMap<String, AttributeValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_json_loads_as_integer() {
        let value: AttributeValue = serde_json::from_str("4").unwrap();
        assert_eq!(value, AttributeValue::Integer(4));

        let value: AttributeValue = serde_json::from_str("4.5").unwrap();
        assert_eq!(value, AttributeValue::Number(4.5));
    }

    #[test]
    fn with_leaves_original_untouched() {
        let base: AttributeSet = [("title", "A")].into_iter().collect();
        let next = base.with("title", "B");

        assert_eq!(base.str("title"), "A");
        assert_eq!(next.str("title"), "B");
    }

    #[test]
    fn nested_json_converts() {
        let json = serde_json::json!({"steps": [{"title": "x", "imageId": null}]});
        let value = AttributeValue::from(json);
        let steps = value.field("steps").and_then(AttributeValue::as_array).unwrap();
        assert_eq!(steps[0].field_str("title"), "x");
        assert!(steps[0].field("imageId").unwrap().is_null());
    }
}
