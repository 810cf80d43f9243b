//! Block Registry - Explicit registry of block definitions
//!
//! Registration happens in two phases:
//! - a [`RegistryBuilder`] collects definitions during start-up, rejecting
//!   duplicate names and invalid definitions
//! - [`RegistryBuilder::build`] seals it into an immutable [`BlockRegistry`]
//!   that is passed to the renderer and editor entry points
//!
//! A sealed registry is cheap to clone and safe to share between threads;
//! it is never mutated after the registration phase closes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::attribute::RawAttributes;
use crate::core::block::{BlockCategory, BlockDefinition};
use crate::core::schema::Hydrated;

/// Collects block definitions during the registration phase
#[derive(Default)]
pub struct RegistryBuilder {
    blocks: HashMap<String, Arc<BlockDefinition>>,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block definition
    ///
    /// # Returns
    /// * `Ok(())` if registration succeeds
    /// * `Err(RegistryError::DuplicateBlock)` if the name is already taken
    /// * `Err(RegistryError::ValidationError)` if the definition is invalid
    pub fn define(&mut self, definition: BlockDefinition) -> Result<(), RegistryError> {
        definition
            .validate()
            .map_err(RegistryError::ValidationError)?;

        let name = definition.name().to_string();
        if self.blocks.contains_key(&name) {
            return Err(RegistryError::DuplicateBlock(name));
        }

        tracing::debug!(block = %name, version = definition.version, "Registered block");
        self.blocks.insert(name, Arc::new(definition));
        Ok(())
    }

    /// Check if a block with the given name was registered
    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Close the registration phase
    pub fn build(self) -> BlockRegistry {
        tracing::info!(blocks = self.blocks.len(), "Block registry sealed");
        BlockRegistry {
            blocks: Arc::new(self.blocks),
        }
    }
}

/// Immutable registry of block definitions
#[derive(Clone, Default)]
pub struct BlockRegistry {
    blocks: Arc<HashMap<String, Arc<BlockDefinition>>>,
}

impl BlockRegistry {
    /// Start a registration phase
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Get a block definition by name
    pub fn get_block(&self, name: &str) -> Result<Arc<BlockDefinition>, RegistryError> {
        self.blocks
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::BlockNotFound(name.to_string()))
    }

    /// All registered definitions, sorted by name
    pub fn get_all_blocks(&self) -> Vec<Arc<BlockDefinition>> {
        let mut blocks: Vec<_> = self.blocks.values().cloned().collect();
        blocks.sort_by(|a, b| a.name().cmp(b.name()));
        blocks
    }

    /// Definitions in an inserter category, sorted by name
    pub fn get_blocks_by_category(&self, category: &BlockCategory) -> Vec<Arc<BlockDefinition>> {
        self.get_all_blocks()
            .into_iter()
            .filter(|b| &b.metadata.category == category)
            .collect()
    }

    /// Search blocks by name, title, description and keywords
    /// (case-insensitive)
    pub fn search_blocks(&self, query: &str) -> Vec<Arc<BlockDefinition>> {
        let query = query.to_lowercase();
        self.get_all_blocks()
            .into_iter()
            .filter(|b| {
                let meta = &b.metadata;
                meta.name.to_lowercase().contains(&query)
                    || meta.title.to_lowercase().contains(&query)
                    || meta.description.to_lowercase().contains(&query)
                    || meta.keywords.iter().any(|k| k.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Number of registered blocks
    pub fn count(&self) -> usize {
        self.blocks.len()
    }

    /// Check if a block with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Hydrate raw attributes against a block's current schema
    pub fn hydrate(&self, name: &str, raw: &RawAttributes) -> Result<Hydrated, RegistryError> {
        Ok(self.get_block(name)?.hydrate(raw))
    }
}

/// Registry error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Block with given name was not found
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// Attempted to register a block name twice
    #[error("Duplicate block name: {0}")]
    DuplicateBlock(String),

    /// Block definition is invalid
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attribute::AttributeSet;
    use crate::core::block::BlockMetadata;
    use crate::core::schema::{AttributeSpec, BlockSchema};
    use crate::render::{RenderContext, StaticRenderer};

    fn definition(name: &str, title: &str, category: BlockCategory) -> BlockDefinition {
        BlockDefinition::new(
            BlockMetadata {
                name: name.into(),
                title: title.into(),
                description: format!("{} block", title),
                category,
                icon: "layout".into(),
                keywords: vec!["section".into()],
            },
            BlockSchema::new(vec![AttributeSpec::string("title", "Untitled")]),
            Arc::new(StaticRenderer::new(|attrs: &AttributeSet, _: &RenderContext<'_>| {
                attrs.str("title").to_string()
            })),
        )
    }

    #[test]
    fn test_registry_creation() {
        let registry = RegistryBuilder::new().build();
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_block_registration() {
        let mut builder = BlockRegistry::builder();
        builder
            .define(definition("test/hero", "Hero", BlockCategory::Design))
            .unwrap();
        let registry = builder.build();

        assert_eq!(registry.count(), 1);
        assert!(registry.get_block("test/hero").is_ok());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut builder = BlockRegistry::builder();
        builder
            .define(definition("test/hero", "Hero", BlockCategory::Design))
            .unwrap();

        let result = builder.define(definition("test/hero", "Other hero", BlockCategory::Text));
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateBlock("test/hero".into())
        );
        assert!(builder.contains("test/hero"));
    }

    #[test]
    fn test_invalid_definition_rejected() {
        let mut builder = BlockRegistry::builder();
        let result = builder.define(definition("hero", "Hero", BlockCategory::Design));
        assert!(matches!(result.unwrap_err(), RegistryError::ValidationError(_)));
    }

    #[test]
    fn test_get_missing_block() {
        let registry = BlockRegistry::default();
        assert!(matches!(
            registry.get_block("test/none").unwrap_err(),
            RegistryError::BlockNotFound(_)
        ));
        assert!(registry.hydrate("test/none", &RawAttributes::new()).is_err());
    }

    #[test]
    fn test_search_and_category() {
        let mut builder = BlockRegistry::builder();
        builder
            .define(definition("test/hero", "Hero", BlockCategory::Design))
            .unwrap();
        builder
            .define(definition("test/quote", "Quote", BlockCategory::Text))
            .unwrap();
        builder
            .define(definition("test/gallery", "Gallery", BlockCategory::Media))
            .unwrap();
        let registry = builder.build();

        assert_eq!(registry.search_blocks("QUOTE").len(), 1);
        assert_eq!(registry.search_blocks("section").len(), 3);
        assert_eq!(registry.get_blocks_by_category(&BlockCategory::Media).len(), 1);

        let names: Vec<_> = registry
            .get_all_blocks()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["test/gallery", "test/hero", "test/quote"]);
    }

    #[test]
    fn test_hydrate_through_registry() {
        let mut builder = BlockRegistry::builder();
        builder
            .define(definition("test/hero", "Hero", BlockCategory::Design))
            .unwrap();
        let registry = builder.build();

        let hydrated = registry.hydrate("test/hero", &RawAttributes::new()).unwrap();
        assert_eq!(hydrated.attributes.str("title"), "Untitled");
    }

    #[test]
    fn test_thread_safety() {
        use std::thread;

        let mut builder = BlockRegistry::builder();
        for i in 0..10 {
            builder
                .define(definition(&format!("test/block-{}", i), "Block", BlockCategory::Design))
                .unwrap();
        }
        let registry = builder.build();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || registry.contains(&format!("test/block-{}", i)))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
