//! Structural operations on sequence attributes
//!
//! Every operation takes the current items and returns a new vector; the
//! input is never modified. After each operation the order-derived field of
//! every item is recomputed from its position, so step numbers can never
//! drift out of sync with display order.

use uuid::Uuid;

use super::EditorError;
use crate::core::attribute::AttributeValue;
use crate::core::schema::SequenceSpec;

/// Generate a fresh item id (`step-3f2a...`)
pub fn new_item_id(spec: &SequenceSpec) -> String {
    format!("{}-{}", spec.id_prefix, Uuid::new_v4().simple())
}

fn item_id<'a>(spec: &SequenceSpec, item: &'a AttributeValue) -> &'a str {
    item.field_str(&spec.id_field)
}

fn set_field(item: &mut AttributeValue, field: &str, value: AttributeValue) {
    if let AttributeValue::Object(fields) = item {
        fields.insert(field.to_string(), value);
    }
}

/// Give every item without an id (or with a duplicate id) a fresh one
///
/// Returns whether anything changed.
pub fn ensure_ids(spec: &SequenceSpec, items: &mut [AttributeValue]) -> bool {
    let mut seen = std::collections::HashSet::new();
    let mut changed = false;
    for item in items.iter_mut() {
        let id = item_id(spec, item).to_string();
        if id.is_empty() || !seen.insert(id) {
            let fresh = new_item_id(spec);
            seen.insert(fresh.clone());
            set_field(item, &spec.id_field, AttributeValue::String(fresh));
            changed = true;
        }
    }
    changed
}

fn check_index(index: usize, len: usize) -> Result<(), EditorError> {
    if index >= len {
        return Err(EditorError::IndexOutOfRange { index, len });
    }
    Ok(())
}

fn finish(spec: &SequenceSpec, mut items: Vec<AttributeValue>) -> Vec<AttributeValue> {
    spec.renumber(&mut items);
    items
}

/// Insert `item` at `index` (`index == len` appends)
///
/// The item is hydrated against the item schema; a missing or colliding id
/// is replaced by a generated one.
pub fn insert_item(
    spec: &SequenceSpec,
    items: &[AttributeValue],
    index: usize,
    item: AttributeValue,
) -> Result<Vec<AttributeValue>, EditorError> {
    if index > items.len() {
        return Err(EditorError::IndexOutOfRange {
            index,
            len: items.len(),
        });
    }
    let raw = match &item {
        AttributeValue::Object(fields) => fields,
        other => {
            return Err(EditorError::InvalidItem(format!(
                "expected an object, found {:?}",
                other.value_type()
            )))
        }
    };

    let mut violations = Vec::new();
    let mut item = spec.hydrate_item(raw, &format!("[{}]", index), &mut violations);
    if let Some(violation) = violations.into_iter().next() {
        return Err(EditorError::Schema(violation));
    }

    let id = item_id(spec, &item).to_string();
    if id.is_empty() || items.iter().any(|existing| item_id(spec, existing) == id) {
        set_field(&mut item, &spec.id_field, AttributeValue::String(new_item_id(spec)));
    }

    let mut next = items.to_vec();
    next.insert(index, item);
    Ok(finish(spec, next))
}

/// Remove the item at `index`
///
/// Fails with `NotEnoughItems` when a non-empty sequence would become empty.
pub fn remove_item(
    spec: &SequenceSpec,
    attribute: &str,
    items: &[AttributeValue],
    index: usize,
) -> Result<Vec<AttributeValue>, EditorError> {
    check_index(index, items.len())?;
    if spec.non_empty && items.len() <= 1 {
        return Err(EditorError::NotEnoughItems {
            attribute: attribute.to_string(),
            minimum: 1,
        });
    }
    let mut next = items.to_vec();
    next.remove(index);
    Ok(finish(spec, next))
}

/// Move the item at `from` so that it ends up at `to`
pub fn move_item(
    spec: &SequenceSpec,
    items: &[AttributeValue],
    from: usize,
    to: usize,
) -> Result<Vec<AttributeValue>, EditorError> {
    check_index(from, items.len())?;
    check_index(to, items.len())?;
    let mut next = items.to_vec();
    let item = next.remove(from);
    next.insert(to, item);
    Ok(finish(spec, next))
}

/// Append a copy of the item at `index` with a fresh id
pub fn duplicate_item(
    spec: &SequenceSpec,
    items: &[AttributeValue],
    index: usize,
) -> Result<Vec<AttributeValue>, EditorError> {
    check_index(index, items.len())?;
    let mut copy = items[index].clone();
    set_field(&mut copy, &spec.id_field, AttributeValue::String(new_item_id(spec)));
    let mut next = items.to_vec();
    next.push(copy);
    Ok(finish(spec, next))
}

/// Replace one field of the item at `index`
///
/// The id and order fields are managed by the sequence and cannot be edited.
pub fn update_item(
    spec: &SequenceSpec,
    items: &[AttributeValue],
    index: usize,
    field: &str,
    value: AttributeValue,
) -> Result<Vec<AttributeValue>, EditorError> {
    check_index(index, items.len())?;
    if spec.is_order_field(field) || field == spec.id_field {
        return Err(EditorError::DerivedField(field.to_string()));
    }
    let field_spec = spec
        .field(field)
        .ok_or_else(|| EditorError::UnknownAttribute(field.to_string()))?;

    let mut current = match &items[index] {
        AttributeValue::Object(fields) => fields.clone(),
        _ => Default::default(),
    };
    current.insert(field.to_string(), value);

    let mut violations = Vec::new();
    let item = spec.hydrate_item(&current, &format!("[{}]", index), &mut violations);
    if let Some(violation) = violations
        .into_iter()
        .find(|v| v.path.ends_with(&format!(".{}", field_spec.name)))
    {
        return Err(EditorError::Schema(violation));
    }

    let mut next = items.to_vec();
    next[index] = item;
    Ok(finish(spec, next))
}
