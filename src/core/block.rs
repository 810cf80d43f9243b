//! Block definitions and instances
//!
//! A [`BlockDefinition`] pairs a named, versioned attribute schema with the
//! server renderer for that block. Older schema versions are kept as
//! [`Deprecation`]s with a migration into the current schema, so content
//! saved by an earlier variant of a block still hydrates into the current
//! attribute set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::attribute::{AttributeSet, AttributeValue, RawAttributes};
use super::schema::{BlockSchema, Hydrated};
use super::BlockId;
use crate::render::BlockRenderer;

/// Block inserter categories
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockCategory {
    /// Text blocks
    Text,
    /// Media blocks
    Media,
    /// Layout and design blocks
    Design,
    /// Site-wide parts (footer, header)
    Theme,
    /// Custom category by slug
    Custom(String),
}

impl BlockCategory {
    /// Category slug as used by the editor
    pub fn slug(&self) -> &str {
        match self {
            BlockCategory::Text => "text",
            BlockCategory::Media => "media",
            BlockCategory::Design => "design",
            BlockCategory::Theme => "theme",
            BlockCategory::Custom(slug) => slug,
        }
    }
}

impl fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// Block metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Unique block name (`namespace/slug`)
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Brief description of the block
    pub description: String,
    /// Inserter category
    pub category: BlockCategory,
    /// Icon identifier
    pub icon: String,
    /// Search keywords
    pub keywords: Vec<String>,
}

/// An older schema version with its migration into the current one
#[derive(Clone)]
pub struct Deprecation {
    /// Schema version this entry describes
    pub version: u32,
    /// The schema content of that version was saved with
    pub schema: BlockSchema,
    /// Whether raw attributes were saved by this version
    pub is_eligible: fn(&RawAttributes) -> bool,
    /// Transform attributes hydrated by the old schema into the current shape
    pub migrate: fn(AttributeSet) -> AttributeSet,
}

impl fmt::Debug for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deprecation")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Registered block type
#[derive(Clone)]
pub struct BlockDefinition {
    pub metadata: BlockMetadata,
    /// Current schema version
    pub version: u32,
    pub schema: BlockSchema,
    /// Older versions, newest first
    pub deprecated: Vec<Deprecation>,
    renderer: Arc<dyn BlockRenderer>,
}

impl BlockDefinition {
    /// Create a definition at schema version 1
    pub fn new(
        metadata: BlockMetadata,
        schema: BlockSchema,
        renderer: Arc<dyn BlockRenderer>,
    ) -> Self {
        Self {
            metadata,
            version: 1,
            schema,
            deprecated: Vec::new(),
            renderer,
        }
    }

    /// Set the current schema version
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Register an older version
    pub fn with_deprecation(mut self, deprecation: Deprecation) -> Self {
        self.deprecated.push(deprecation);
        self.deprecated.sort_by(|a, b| b.version.cmp(&a.version));
        self
    }

    /// Block name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Server renderer of this block
    pub fn renderer(&self) -> &dyn BlockRenderer {
        self.renderer.as_ref()
    }

    /// Validate the definition before registration
    pub fn validate(&self) -> Result<(), String> {
        let name = &self.metadata.name;
        match name.split_once('/') {
            Some((ns, slug)) if !ns.is_empty() && !slug.is_empty() && !slug.contains('/') => {}
            _ => return Err(format!("Block name '{}' must be 'namespace/slug'", name)),
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '/')
        {
            return Err(format!("Block name '{}' contains invalid characters", name));
        }
        self.schema.validate()?;
        for deprecation in &self.deprecated {
            if deprecation.version >= self.version {
                return Err(format!(
                    "Deprecated version {} is not older than current version {}",
                    deprecation.version, self.version
                ));
            }
            deprecation.schema.validate()?;
        }
        Ok(())
    }

    /// Hydrate raw attributes, migrating content saved by an older version
    pub fn hydrate(&self, raw: &RawAttributes) -> Hydrated {
        let hydrated = match self.deprecated.iter().find(|d| (d.is_eligible)(raw)) {
            Some(deprecation) => self.migrate(deprecation, raw),
            None => self.schema.hydrate(raw),
        };

        for violation in &hydrated.violations {
            tracing::warn!(block = %self.metadata.name, path = %violation.path, "{}", violation);
        }
        hydrated
    }

    fn migrate(&self, deprecation: &Deprecation, raw: &RawAttributes) -> Hydrated {
        tracing::debug!(
            block = %self.metadata.name,
            from = deprecation.version,
            to = self.version,
            "Migrating block attributes"
        );
        let old = deprecation.schema.hydrate(raw);
        let migrated = (deprecation.migrate)(old.attributes);
        let mut current = self.schema.hydrate(&migrated.into_map());

        let mut violations = old.violations;
        violations.append(&mut current.violations);
        current.violations = violations;
        current.unknown = old
            .unknown
            .into_iter()
            .filter(|(key, _)| self.schema.attribute(key).is_none())
            .collect();
        current
    }
}

impl fmt::Debug for BlockDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDefinition")
            .field("name", &self.metadata.name)
            .field("version", &self.version)
            .field("deprecated", &self.deprecated)
            .finish_non_exhaustive()
    }
}

/// A block placed in a document
#[derive(Debug, Clone, PartialEq)]
pub struct BlockInstance {
    /// In-memory identity of this instance
    pub id: BlockId,
    /// Block name
    pub name: String,
    /// Hydrated attributes
    pub attributes: AttributeSet,
    /// Attributes the current schema does not know, preserved on save
    pub unknown: RawAttributes,
}

impl BlockInstance {
    /// Create an instance from hydrated attributes
    pub fn new(name: impl Into<String>, hydrated: Hydrated) -> Self {
        Self {
            id: BlockId::new(),
            name: name.into(),
            attributes: hydrated.attributes,
            unknown: hydrated.unknown,
        }
    }

    /// HTML anchor id, if set
    pub fn anchor(&self) -> Option<&str> {
        Some(self.attributes.str("anchor")).filter(|a| !a.is_empty())
    }

    /// Attributes to persist: known attributes plus preserved unknown ones
    pub fn raw_attributes(&self) -> RawAttributes {
        let mut raw = self.unknown.clone();
        for (key, value) in self.attributes.iter() {
            raw.insert(key.clone(), value.clone());
        }
        raw
    }
}

/// Attribute keys every block supports
pub const SUPPORT_ATTRIBUTES: [&str; 2] = ["anchor", "className"];

/// Whether the raw attributes carry `key` with a non-null value
pub fn has_attribute(raw: &RawAttributes, key: &str) -> bool {
    raw.get(key).is_some_and(|v| !matches!(v, AttributeValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::AttributeSpec;
    use crate::render::{RenderContext, StaticRenderer};

    fn metadata(name: &str) -> BlockMetadata {
        BlockMetadata {
            name: name.into(),
            title: "Test".into(),
            description: String::new(),
            category: BlockCategory::Design,
            icon: "layout".into(),
            keywords: vec![],
        }
    }

    fn renderer() -> Arc<dyn BlockRenderer> {
        Arc::new(StaticRenderer::new(|attrs: &AttributeSet, _: &RenderContext<'_>| {
            format!("<p>{}</p>", attrs.str("label"))
        }))
    }

    fn v2() -> BlockDefinition {
        let v1 = Deprecation {
            version: 1,
            schema: BlockSchema::new(vec![AttributeSpec::string("text", "")]),
            is_eligible: |raw| has_attribute(raw, "text"),
            migrate: |old| {
                let text = old.str("text").to_string();
                AttributeSet::new().with("label", text)
            },
        };
        BlockDefinition::new(
            metadata("test/label"),
            BlockSchema::new(vec![AttributeSpec::string("label", "default")]),
            renderer(),
        )
        .with_version(2)
        .with_deprecation(v1)
    }

    #[test]
    fn test_name_validation() {
        assert!(v2().validate().is_ok());

        let bad = BlockDefinition::new(metadata("noslash"), BlockSchema::default(), renderer());
        assert!(bad.validate().is_err());

        let upper = BlockDefinition::new(metadata("Test/Label"), BlockSchema::default(), renderer());
        assert!(upper.validate().is_err());
    }

    #[test]
    fn test_deprecated_content_is_migrated() {
        let mut raw = RawAttributes::new();
        raw.insert("text".into(), "old label".into());
        raw.insert("future".into(), true.into());

        let hydrated = v2().hydrate(&raw);
        assert_eq!(hydrated.attributes.str("label"), "old label");
        assert!(!hydrated.attributes.contains("text"));
        assert!(hydrated.unknown.contains_key("future"));
    }

    #[test]
    fn test_current_content_skips_migration() {
        let mut raw = RawAttributes::new();
        raw.insert("label".into(), "new".into());
        let hydrated = v2().hydrate(&raw);
        assert_eq!(hydrated.attributes.str("label"), "new");
    }

    #[test]
    fn test_deprecation_must_be_older() {
        let def = v2().with_version(1);
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_instance_keeps_unknown_attributes() {
        let mut raw = RawAttributes::new();
        raw.insert("label".into(), "x".into());
        raw.insert("later".into(), 3i64.into());
        let instance = BlockInstance::new("test/label", v2().hydrate(&raw));

        let saved = instance.raw_attributes();
        assert_eq!(saved.get("later"), Some(&AttributeValue::Integer(3)));
        assert_eq!(saved.get("label"), Some(&AttributeValue::from("x")));
    }
}
