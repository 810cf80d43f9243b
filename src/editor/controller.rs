//! Editor State Controller
//!
//! Holds the attribute set of one block instance as a history of immutable
//! snapshots. `set` and the structural sequence operations never mutate a
//! snapshot in place; they push a new one, which makes undo/redo a matter of
//! moving a cursor.

use async_trait::async_trait;
use std::sync::Arc;

use super::sequence;
use super::EditorError;
use crate::config::EditorConfig;
use crate::core::attribute::{AttributeSet, AttributeValue, RawAttributes};
use crate::core::block::{BlockDefinition, BlockInstance};
use crate::core::media::ImageReference;
use crate::core::schema::{AttributeSpec, SequenceSpec};

/// Image chosen in the media picker
#[derive(Debug, Clone, PartialEq)]
pub struct PickedImage {
    pub reference: ImageReference,
    /// Alt text stored with the media item
    pub alt: String,
}

/// Media picker capability injected by the host UI
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// Let the user choose an image; `None` when the picker is cancelled
    async fn pick_image(&self) -> Option<PickedImage>;
}

/// Field names an image is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBinding {
    pub url_field: String,
    pub id_field: String,
    pub alt_field: String,
}

impl ImageBinding {
    /// The `imageUrl` / `imageId` / `imageAlt` convention used by all blocks
    pub fn standard() -> Self {
        Self {
            url_field: "imageUrl".into(),
            id_field: "imageId".into(),
            alt_field: "imageAlt".into(),
        }
    }
}

/// Where a picked image goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTarget {
    /// Top-level attributes of the block
    Attributes(ImageBinding),
    /// Fields of one item of a sequence attribute
    Item {
        attribute: String,
        index: usize,
        binding: ImageBinding,
    },
}

/// Editor state of one block instance
pub struct EditorState {
    definition: Arc<BlockDefinition>,
    history: Vec<Arc<AttributeSet>>,
    cursor: usize,
    history_limit: usize,
    unknown: RawAttributes,
}

impl EditorState {
    /// Open raw stored attributes for editing
    ///
    /// Sequence items without a stable id get one here, so identity is
    /// available to every later operation.
    pub fn open(
        definition: Arc<BlockDefinition>,
        raw: &RawAttributes,
        config: &EditorConfig,
    ) -> Self {
        let hydrated = definition.hydrate(raw);
        let mut attributes = hydrated.attributes;

        for spec in definition.schema.attributes() {
            if let Some(seq) = &spec.sequence {
                let mut items = attributes.items(&spec.name).to_vec();
                if sequence::ensure_ids(seq, &mut items) {
                    attributes = attributes.with(spec.name.clone(), items);
                }
            }
        }

        Self {
            definition,
            history: vec![Arc::new(attributes)],
            cursor: 0,
            history_limit: config.history_limit.max(1),
            unknown: hydrated.unknown,
        }
    }

    /// Open an existing block instance
    pub fn from_instance(
        definition: Arc<BlockDefinition>,
        instance: &BlockInstance,
        config: &EditorConfig,
    ) -> Self {
        Self::open(definition, &instance.raw_attributes(), config)
    }

    /// Definition of the edited block
    pub fn definition(&self) -> &BlockDefinition {
        &self.definition
    }

    /// Current snapshot
    pub fn attributes(&self) -> Arc<AttributeSet> {
        Arc::clone(&self.history[self.cursor])
    }

    /// Current value of an attribute
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.history[self.cursor].get(key)
    }

    /// Replace an attribute, yielding the new snapshot
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Arc<AttributeSet>, EditorError> {
        let value = self
            .definition
            .schema
            .hydrate_attribute(key, &value.into())
            .ok_or_else(|| EditorError::UnknownAttribute(key.to_string()))??;

        let value = match (self.definition.schema.sequence(key), value) {
            (Some(seq), AttributeValue::Array(items)) if seq.non_empty && items.is_empty() => {
                return Err(EditorError::NotEnoughItems {
                    attribute: key.to_string(),
                    minimum: 1,
                });
            }
            (Some(seq), AttributeValue::Array(mut items)) => {
                sequence::ensure_ids(seq, &mut items);
                AttributeValue::Array(items)
            }
            (_, value) => value,
        };

        let next = self.history[self.cursor].with(key, value);
        Ok(self.commit(next))
    }

    /// Insert an item into a sequence attribute
    pub fn insert_item(
        &mut self,
        key: &str,
        index: usize,
        item: AttributeValue,
    ) -> Result<Arc<AttributeSet>, EditorError> {
        self.edit_sequence(key, |seq, items| sequence::insert_item(seq, items, index, item))
    }

    /// Remove an item from a sequence attribute
    pub fn remove_item(&mut self, key: &str, index: usize) -> Result<Arc<AttributeSet>, EditorError> {
        self.edit_sequence(key, |seq, items| sequence::remove_item(seq, key, items, index))
    }

    /// Move an item within a sequence attribute
    pub fn move_item(
        &mut self,
        key: &str,
        from: usize,
        to: usize,
    ) -> Result<Arc<AttributeSet>, EditorError> {
        self.edit_sequence(key, |seq, items| sequence::move_item(seq, items, from, to))
    }

    /// Append a copy of an item with a fresh id
    pub fn duplicate_item(
        &mut self,
        key: &str,
        index: usize,
    ) -> Result<Arc<AttributeSet>, EditorError> {
        self.edit_sequence(key, |seq, items| sequence::duplicate_item(seq, items, index))
    }

    /// Edit one field of an item
    pub fn update_item(
        &mut self,
        key: &str,
        index: usize,
        field: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Arc<AttributeSet>, EditorError> {
        let value = value.into();
        self.edit_sequence(key, |seq, items| {
            sequence::update_item(seq, items, index, field, value)
        })
    }

    /// Whether there is a snapshot to go back to
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether an undone snapshot can be restored
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    /// Step back one snapshot
    pub fn undo(&mut self) -> Option<Arc<AttributeSet>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.attributes())
    }

    /// Step forward one snapshot
    pub fn redo(&mut self) -> Option<Arc<AttributeSet>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.attributes())
    }

    /// Ask the picker for an image and write it to `target`
    ///
    /// Returns `Ok(None)` when the picker was cancelled; the state is then
    /// unchanged.
    pub async fn pick_image(
        &mut self,
        picker: &dyn MediaPicker,
        target: &ImageTarget,
    ) -> Result<Option<Arc<AttributeSet>>, EditorError> {
        let Some(picked) = picker.pick_image().await else {
            return Ok(None);
        };

        let snapshot = match target {
            ImageTarget::Attributes(binding) => {
                let schema = &self.definition.schema;
                let id_spec = schema
                    .attribute(&binding.id_field)
                    .ok_or_else(|| EditorError::UnknownAttribute(binding.id_field.clone()))?;
                let mut next = (*self.attributes()).clone();
                for (field, value) in image_fields(binding, id_spec, &picked, "") {
                    let value = schema
                        .hydrate_attribute(&field, &value)
                        .ok_or_else(|| EditorError::UnknownAttribute(field.clone()))??;
                    next.insert(field, value);
                }
                self.commit(next)
            }
            ImageTarget::Item {
                attribute,
                index,
                binding,
            } => self.edit_sequence(attribute, |seq, items| {
                let id_spec = seq
                    .field(&binding.id_field)
                    .ok_or_else(|| EditorError::UnknownAttribute(binding.id_field.clone()))?;
                let title = items.get(*index).map_or("", |item| item.field_str("title"));
                let fields = image_fields(binding, id_spec, &picked, title);
                let mut items = items.to_vec();
                for (field, value) in fields {
                    items = sequence::update_item(seq, &items, *index, &field, value)?;
                }
                Ok(items)
            })?,
        };
        Ok(Some(snapshot))
    }

    /// Attributes to persist, including keys this schema does not know
    pub fn raw_attributes(&self) -> RawAttributes {
        let mut raw = self.unknown.clone();
        for (key, value) in self.history[self.cursor].iter() {
            raw.insert(key.clone(), value.clone());
        }
        raw
    }

    /// Current state as a block instance
    pub fn to_instance(&self) -> BlockInstance {
        BlockInstance::new(
            self.definition.name(),
            crate::core::schema::Hydrated {
                attributes: (*self.attributes()).clone(),
                violations: Vec::new(),
                unknown: self.unknown.clone(),
            },
        )
    }

    fn edit_sequence<F>(&mut self, key: &str, op: F) -> Result<Arc<AttributeSet>, EditorError>
    where
        F: FnOnce(&SequenceSpec, &[AttributeValue]) -> Result<Vec<AttributeValue>, EditorError>,
    {
        let spec = self
            .definition
            .schema
            .attribute(key)
            .ok_or_else(|| EditorError::UnknownAttribute(key.to_string()))?;
        let seq = spec
            .sequence
            .as_ref()
            .ok_or_else(|| EditorError::NotASequence(key.to_string()))?;

        let current = Arc::clone(&self.history[self.cursor]);
        let items = op(seq, current.items(key))?;
        Ok(self.commit(current.with(key, items)))
    }

    fn commit(&mut self, next: AttributeSet) -> Arc<AttributeSet> {
        if *self.history[self.cursor] == next {
            return self.attributes();
        }
        self.history.truncate(self.cursor + 1);
        self.history.push(Arc::new(next));
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
        self.cursor = self.history.len() - 1;
        self.attributes()
    }
}

/// Fields written by a pick; an empty alt text falls back to `fallback_alt`
fn image_fields(
    binding: &ImageBinding,
    id_spec: &AttributeSpec,
    picked: &PickedImage,
    fallback_alt: &str,
) -> Vec<(String, AttributeValue)> {
    let id = match picked.reference.media_id() {
        Some(id) => AttributeValue::from(id),
        None if id_spec.nullable => AttributeValue::Null,
        None => AttributeValue::Integer(0),
    };
    let alt = if picked.alt.is_empty() { fallback_alt } else { picked.alt.as_str() };
    vec![
        (
            binding.url_field.clone(),
            AttributeValue::from(picked.reference.cached_url().unwrap_or("")),
        ),
        (binding.id_field.clone(), id),
        (binding.alt_field.clone(), AttributeValue::from(alt)),
    ]
}
