//! Attribute schemas and hydration
//!
//! A [`BlockSchema`] declares the typed fields of a block and their defaults.
//! [`BlockSchema::hydrate`] turns raw stored attributes into a complete,
//! well-typed [`AttributeSet`]:
//!
//! - values of the wrong type fall back to the default and are reported as a
//!   [`SchemaViolation`] (never fatal)
//! - missing keys are filled with defaults
//! - keys absent from the schema are dropped and returned separately so the
//!   document layer can preserve them
//!
//! Sequence attributes are hydrated item by item against their item schema
//! and have their order-derived field recomputed from position.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::attribute::{AttributeSet, AttributeType, AttributeValue, RawAttributes};

/// Widest zero-pad width a sequence may declare
pub const MAX_ORDER_WIDTH: usize = 4;

/// Zero-pad a 1-based position to `width` digits ("01", "02", ...)
pub fn zero_pad(position: usize, width: usize) -> String {
    format!("{:0width$}", position, width = width)
}

/// Attribute definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Attribute key
    pub name: String,
    /// Declared type
    pub attr_type: AttributeType,
    /// Default value
    pub default: AttributeValue,
    /// Whether `null` is an accepted value
    pub nullable: bool,
    /// Optional value constraints
    pub constraints: Option<AttributeConstraints>,
    /// Item schema for ordered sequences of sub-records
    pub sequence: Option<SequenceSpec>,
}

impl AttributeSpec {
    fn new(name: impl Into<String>, attr_type: AttributeType, default: AttributeValue) -> Self {
        Self {
            name: name.into(),
            attr_type,
            default,
            nullable: false,
            constraints: None,
            sequence: None,
        }
    }

    /// String attribute with a default
    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, AttributeType::String, AttributeValue::String(default.into()))
    }

    /// Integer-valued number attribute with a default
    pub fn integer(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, AttributeType::Number, AttributeValue::Integer(default))
    }

    /// Boolean attribute with a default
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, AttributeType::Boolean, AttributeValue::Boolean(default))
    }

    /// Nullable number attribute defaulting to `null` (media ids)
    pub fn optional_id(name: impl Into<String>) -> Self {
        let mut spec = Self::new(name, AttributeType::Number, AttributeValue::Null);
        spec.nullable = true;
        spec
    }

    /// Ordered sequence attribute with an item schema
    pub fn sequence(
        name: impl Into<String>,
        sequence: SequenceSpec,
        default: Vec<AttributeValue>,
    ) -> Self {
        let mut spec = Self::new(name, AttributeType::Array, AttributeValue::Array(default));
        spec.sequence = Some(sequence);
        spec
    }

    /// Restrict to an allowed set of string values
    pub fn one_of(mut self, values: &[&str]) -> Self {
        let allowed = values.iter().map(|v| AttributeValue::from(*v)).collect();
        self.constraints = Some(
            self.constraints
                .unwrap_or_default()
                .with_allowed_values(allowed),
        );
        self
    }

    /// Restrict a number to an inclusive range
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.constraints = Some(self.constraints.unwrap_or_default().with_min(min).with_max(max));
        self
    }

    /// Accept `null` as a value
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    fn hydrate_value(
        &self,
        raw: Option<&AttributeValue>,
        path: &str,
        violations: &mut Vec<SchemaViolation>,
    ) -> AttributeValue {
        let raw = match raw {
            None => return self.default.clone(),
            Some(value) => value,
        };

        if raw.is_null() {
            if self.nullable {
                return AttributeValue::Null;
            }
            violations.push(SchemaViolation::mismatch(path, self.attr_type, raw));
            return self.default.clone();
        }

        let coerced = match coerce(self.attr_type, raw) {
            Some(value) => value,
            None => {
                violations.push(SchemaViolation::mismatch(path, self.attr_type, raw));
                return self.default.clone();
            }
        };

        if let Some(constraints) = &self.constraints {
            if let Err(reason) = constraints.check(&coerced) {
                violations.push(SchemaViolation {
                    path: path.to_string(),
                    expected: reason,
                    found: describe(&coerced),
                });
                return self.default.clone();
            }
        }

        match (&self.sequence, coerced) {
            (Some(sequence), AttributeValue::Array(items)) => {
                AttributeValue::Array(sequence.hydrate_items(&items, path, violations))
            }
            (_, value) => value,
        }
    }
}

/// Numeric and enumeration constraints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeConstraints {
    /// Minimum value (for numbers)
    pub min: Option<f64>,
    /// Maximum value (for numbers)
    pub max: Option<f64>,
    /// Allowed values (for enums)
    pub allowed_values: Option<Vec<AttributeValue>>,
}

impl AttributeConstraints {
    /// Set minimum value
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set maximum value
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Set allowed values
    pub fn with_allowed_values(mut self, values: Vec<AttributeValue>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    fn check(&self, value: &AttributeValue) -> Result<(), String> {
        if let Some(allowed) = &self.allowed_values {
            if !allowed.contains(value) {
                let names: Vec<String> = allowed.iter().map(describe).collect();
                return Err(format!("one of [{}]", names.join(", ")));
            }
        }
        if let Some(n) = value.as_number() {
            if self.min.is_some_and(|min| n < min) || self.max.is_some_and(|max| n > max) {
                return Err(format!(
                    "number in {}..={}",
                    self.min.map(|m| m.to_string()).unwrap_or_default(),
                    self.max.map(|m| m.to_string()).unwrap_or_default(),
                ));
            }
        }
        Ok(())
    }
}

/// Item schema of an ordered sequence attribute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceSpec {
    /// Fields of each sub-record
    pub fields: Vec<AttributeSpec>,
    /// Field holding the stable item identity
    pub id_field: String,
    /// Prefix for generated ids (`step` → `step-<uuid>`)
    pub id_prefix: String,
    /// Field derived from the item's position, if any
    pub order_field: Option<String>,
    /// Zero-pad width of the order field
    pub order_width: usize,
    /// Whether editing may never leave the sequence empty
    pub non_empty: bool,
}

impl SequenceSpec {
    /// Create a sequence spec with an `id` identity field
    pub fn new(fields: Vec<AttributeSpec>) -> Self {
        Self {
            fields,
            id_field: "id".into(),
            id_prefix: "item".into(),
            order_field: None,
            order_width: 2,
            non_empty: false,
        }
    }

    /// Set the generated id prefix
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Declare a position-derived field
    pub fn with_order_field(mut self, field: impl Into<String>, width: usize) -> Self {
        self.order_field = Some(field.into());
        self.order_width = width;
        self
    }

    /// Forbid removing the last item
    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    /// Look up an item field definition
    pub fn field(&self, name: &str) -> Option<&AttributeSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is the position-derived field
    pub fn is_order_field(&self, name: &str) -> bool {
        self.order_field.as_deref() == Some(name)
    }

    /// Recompute the order field of every item from its position
    pub fn renumber(&self, items: &mut [AttributeValue]) {
        let Some(order_field) = &self.order_field else {
            return;
        };
        for (index, item) in items.iter_mut().enumerate() {
            if let AttributeValue::Object(fields) = item {
                fields.insert(
                    order_field.clone(),
                    AttributeValue::String(zero_pad(index + 1, self.order_width)),
                );
            }
        }
    }

    /// Hydrate one sub-record: default-fill, coerce, drop unknown fields
    pub fn hydrate_item(
        &self,
        raw: &BTreeMap<String, AttributeValue>,
        path: &str,
        violations: &mut Vec<SchemaViolation>,
    ) -> AttributeValue {
        let mut fields = BTreeMap::new();
        for spec in &self.fields {
            let field_path = format!("{}.{}", path, spec.name);
            let value = spec.hydrate_value(raw.get(&spec.name), &field_path, violations);
            fields.insert(spec.name.clone(), value);
        }
        // The id field is always carried, even when the item schema omits it.
        if !fields.contains_key(&self.id_field) {
            let id = raw
                .get(&self.id_field)
                .and_then(AttributeValue::as_str)
                .unwrap_or("");
            fields.insert(self.id_field.clone(), AttributeValue::from(id));
        }
        AttributeValue::Object(fields)
    }

    fn hydrate_items(
        &self,
        items: &[AttributeValue],
        path: &str,
        violations: &mut Vec<SchemaViolation>,
    ) -> Vec<AttributeValue> {
        let mut hydrated = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", path, index);
            match item {
                AttributeValue::Object(raw) => {
                    hydrated.push(self.hydrate_item(raw, &item_path, violations))
                }
                other => violations.push(SchemaViolation::mismatch(
                    &item_path,
                    AttributeType::Object,
                    other,
                )),
            }
        }
        self.renumber(&mut hydrated);
        hydrated
    }
}

/// Non-fatal schema violation found while hydrating
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema violation at {path}: expected {expected}, found {found}")]
pub struct SchemaViolation {
    /// Attribute path (`processSteps[1].title`)
    pub path: String,
    /// What the schema expected
    pub expected: String,
    /// What was found instead
    pub found: String,
}

impl SchemaViolation {
    fn mismatch(path: &str, expected: AttributeType, found: &AttributeValue) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.to_string(),
            found: describe(found),
        }
    }
}

/// Result of hydrating raw attributes against a schema
#[derive(Debug, Clone, PartialEq)]
pub struct Hydrated {
    /// Complete, well-typed attribute set
    pub attributes: AttributeSet,
    /// Values that were replaced by their defaults
    pub violations: Vec<SchemaViolation>,
    /// Keys the schema does not know, kept for re-serialization
    pub unknown: RawAttributes,
}

impl Hydrated {
    /// Whether hydration needed no fallback
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Block attribute schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockSchema {
    attributes: Vec<AttributeSpec>,
    /// Message rendered when the block's sequence is empty
    pub empty_state: Option<String>,
}

impl BlockSchema {
    /// Create a schema from attribute definitions
    pub fn new(attributes: Vec<AttributeSpec>) -> Self {
        Self {
            attributes,
            empty_state: None,
        }
    }

    /// Add the `anchor` and `className` attributes every block supports
    pub fn with_supports(mut self) -> Self {
        for key in super::block::SUPPORT_ATTRIBUTES {
            if self.attribute(key).is_none() {
                self.attributes.push(AttributeSpec::string(key, ""));
            }
        }
        self
    }

    /// Declare the empty-state message
    pub fn with_empty_state(mut self, message: impl Into<String>) -> Self {
        self.empty_state = Some(message.into());
        self
    }

    /// All attribute definitions in declaration order
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Look up an attribute definition
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Sequence spec of a sequence attribute
    pub fn sequence(&self, name: &str) -> Option<&SequenceSpec> {
        self.attribute(name).and_then(|a| a.sequence.as_ref())
    }

    /// Validate the schema itself: unique names and well-typed defaults
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::BTreeSet::new();
        for spec in &self.attributes {
            if !seen.insert(spec.name.as_str()) {
                return Err(format!("Attribute '{}' declared twice", spec.name));
            }
            if let Some(seq) = spec.sequence.as_ref().filter(|seq| seq.order_field.is_some()) {
                if !(1..=MAX_ORDER_WIDTH).contains(&seq.order_width) {
                    return Err(format!(
                        "Order width of '{}' must be between 1 and {}",
                        spec.name, MAX_ORDER_WIDTH
                    ));
                }
            }
            let mut violations = Vec::new();
            spec.hydrate_value(Some(&spec.default), &spec.name, &mut violations);
            if let Some(violation) = violations.into_iter().next() {
                return Err(format!("Invalid default: {}", violation));
            }
        }
        Ok(())
    }

    /// Attribute set holding every default
    pub fn defaults(&self) -> AttributeSet {
        self.hydrate(&RawAttributes::new()).attributes
    }

    /// Hydrate a single attribute value without touching the rest of a set
    pub fn hydrate_attribute(
        &self,
        name: &str,
        raw: &AttributeValue,
    ) -> Option<Result<AttributeValue, SchemaViolation>> {
        let spec = self.attribute(name)?;
        let mut violations = Vec::new();
        let value = spec.hydrate_value(Some(raw), name, &mut violations);
        Some(match violations.into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(value),
        })
    }

    /// Validate, coerce and default-fill raw attributes
    pub fn hydrate(&self, raw: &RawAttributes) -> Hydrated {
        let mut violations = Vec::new();
        let mut attributes = AttributeSet::new();

        for spec in &self.attributes {
            let value = spec.hydrate_value(raw.get(&spec.name), &spec.name, &mut violations);
            attributes.insert(spec.name.clone(), value);
        }

        let unknown = raw
            .iter()
            .filter(|(key, _)| self.attribute(key).is_none())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Hydrated {
            attributes,
            violations,
            unknown,
        }
    }
}

/// Lossless coercion of `value` to `target`; `None` on mismatch
fn coerce(target: AttributeType, value: &AttributeValue) -> Option<AttributeValue> {
    match (target, value) {
        (AttributeType::String, AttributeValue::String(_)) => Some(value.clone()),
        (AttributeType::String, AttributeValue::Integer(i)) => Some(AttributeValue::String(i.to_string())),
        (AttributeType::String, AttributeValue::Number(n)) if n.is_finite() => {
            Some(AttributeValue::String(n.to_string()))
        }
        (AttributeType::Number, AttributeValue::Integer(_)) => Some(value.clone()),
        (AttributeType::Number, AttributeValue::Number(n)) if n.is_finite() => Some(value.clone()),
        (AttributeType::Number, AttributeValue::String(s)) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Some(AttributeValue::Integer(i))
            } else {
                s.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(AttributeValue::Number)
            }
        }
        (AttributeType::Boolean, AttributeValue::Boolean(_)) => Some(value.clone()),
        (AttributeType::Array, AttributeValue::Array(_)) => Some(value.clone()),
        (AttributeType::Object, AttributeValue::Object(_)) => Some(value.clone()),
        _ => None,
    }
}

fn describe(value: &AttributeValue) -> String {
    match value {
        AttributeValue::String(s) => format!("\"{}\"", s),
        AttributeValue::Boolean(b) => b.to_string(),
        AttributeValue::Integer(i) => i.to_string(),
        AttributeValue::Number(n) => n.to_string(),
        AttributeValue::Array(items) => format!("array of {}", items.len()),
        AttributeValue::Object(_) => "object".into(),
        AttributeValue::Null => "null".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(title: &str, number: &str) -> AttributeValue {
        AttributeValue::object([
            ("id", AttributeValue::from(format!("step-{}", title))),
            ("stepNumber", number.into()),
            ("title", title.into()),
        ])
    }

    fn schema() -> BlockSchema {
        let steps = SequenceSpec::new(vec![
            AttributeSpec::string("stepNumber", ""),
            AttributeSpec::string("title", ""),
            AttributeSpec::string("description", ""),
            AttributeSpec::optional_id("imageId"),
        ])
        .with_id_prefix("step")
        .with_order_field("stepNumber", 2)
        .non_empty();

        BlockSchema::new(vec![
            AttributeSpec::string("title", "Hello"),
            AttributeSpec::integer("columns", 4).range(1.0, 6.0),
            AttributeSpec::boolean("hover", true),
            AttributeSpec::string("radius", "lg").one_of(&["none", "lg", "xl"]),
            AttributeSpec::sequence("steps", steps, vec![step("A", "01")]),
        ])
    }

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad(1, 2), "01");
        assert_eq!(zero_pad(12, 2), "12");
        assert_eq!(zero_pad(123, 2), "123");
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let hydrated = schema().hydrate(&RawAttributes::new());
        assert!(hydrated.is_clean());
        assert_eq!(hydrated.attributes.str("title"), "Hello");
        assert_eq!(hydrated.attributes.integer("columns"), Some(4));
        assert_eq!(hydrated.attributes.items("steps").len(), 1);
    }

    #[test]
    fn test_type_mismatch_reports_violation() {
        let mut raw = RawAttributes::new();
        raw.insert("hover".into(), "yes".into());
        let hydrated = schema().hydrate(&raw);

        assert!(hydrated.attributes.bool("hover"));
        assert_eq!(hydrated.violations.len(), 1);
        assert_eq!(hydrated.violations[0].path, "hover");
        assert_eq!(hydrated.violations[0].expected, "boolean");
    }

    #[test]
    fn test_unknown_keys_dropped_and_reported() {
        let mut raw = RawAttributes::new();
        raw.insert("futureField".into(), 7i64.into());
        let hydrated = schema().hydrate(&raw);

        assert!(!hydrated.attributes.contains("futureField"));
        assert_eq!(hydrated.unknown.get("futureField"), Some(&AttributeValue::Integer(7)));
    }

    #[test]
    fn test_constraints() {
        let mut raw = RawAttributes::new();
        raw.insert("columns".into(), 9i64.into());
        raw.insert("radius".into(), "huge".into());
        let hydrated = schema().hydrate(&raw);

        assert_eq!(hydrated.attributes.integer("columns"), Some(4));
        assert_eq!(hydrated.attributes.str("radius"), "lg");
        assert_eq!(hydrated.violations.len(), 2);
    }

    #[test]
    fn test_lossless_coercions() {
        let mut raw = RawAttributes::new();
        raw.insert("columns".into(), "3".into());
        raw.insert("title".into(), 12i64.into());
        let hydrated = schema().hydrate(&raw);

        assert!(hydrated.is_clean());
        assert_eq!(hydrated.attributes.integer("columns"), Some(3));
        assert_eq!(hydrated.attributes.str("title"), "12");
    }

    #[test]
    fn test_sequence_items_hydrated_and_renumbered() {
        let mut raw = RawAttributes::new();
        raw.insert(
            "steps".into(),
            AttributeValue::Array(vec![
                step("A", "07"),
                AttributeValue::from("not a step"),
                AttributeValue::object([("title", AttributeValue::from("B")), ("extra", true.into())]),
            ]),
        );
        let hydrated = schema().hydrate(&raw);
        let steps = hydrated.attributes.items("steps");

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].field_str("stepNumber"), "01");
        assert_eq!(steps[1].field_str("stepNumber"), "02");
        assert_eq!(steps[1].field_str("description"), "");
        assert!(steps[1].field("extra").is_none());
        assert!(steps[1].field("imageId").unwrap().is_null());
        assert_eq!(hydrated.violations.len(), 1);
        assert_eq!(hydrated.violations[0].path, "steps[1]");
    }

    #[test]
    fn test_null_only_for_nullable() {
        let mut raw = RawAttributes::new();
        raw.insert("title".into(), AttributeValue::Null);
        let hydrated = schema().hydrate(&raw);
        assert_eq!(hydrated.attributes.str("title"), "Hello");
        assert_eq!(hydrated.violations[0].found, "null");
    }

    #[test]
    fn test_hydrate_is_idempotent() {
        let mut raw = RawAttributes::new();
        raw.insert("columns".into(), "2".into());
        raw.insert("steps".into(), AttributeValue::Array(vec![step("X", "9")]));
        let once = schema().hydrate(&raw).attributes;
        let twice = schema().hydrate(&once.clone().into_map()).attributes;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_schema_validation() {
        assert!(schema().validate().is_ok());

        let bad = BlockSchema::new(vec![
            AttributeSpec::string("a", ""),
            AttributeSpec::string("a", ""),
        ]);
        assert!(bad.validate().is_err());

        let bad_default = BlockSchema::new(vec![AttributeSpec::string("a", "x").one_of(&["y"])]);
        assert!(bad_default.validate().is_err());
    }

    #[test]
    fn test_order_width_is_bounded() {
        let sequence = |width| {
            let items = SequenceSpec::new(vec![AttributeSpec::string("n", "")]).with_order_field("n", width);
            BlockSchema::new(vec![AttributeSpec::sequence("items", items, vec![])])
        };
        assert!(sequence(MAX_ORDER_WIDTH).validate().is_ok());
        assert!(sequence(0).validate().is_err());
        assert!(sequence(MAX_ORDER_WIDTH + 1).validate().is_err());
    }
}
