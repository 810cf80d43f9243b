//! Core block abstractions and types
//!
//! This module defines attribute values and schemas, block definitions and
//! instances, the block registry, and the interfaces of the external stores
//! (media library, post store) that blocks consume.

pub mod attribute;
pub mod schema;
pub mod block;
pub mod registry;
pub mod media;
pub mod posts;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use attribute::{AttributeSet, AttributeType, AttributeValue, RawAttributes};
pub use block::{BlockCategory, BlockDefinition, BlockInstance, BlockMetadata, Deprecation};
pub use registry::{BlockRegistry, RegistryBuilder, RegistryError};
pub use schema::{AttributeSpec, BlockSchema, Hydrated, SchemaViolation, SequenceSpec};

/// In-memory identifier of a block instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
    /// Generate a new random block ID
    pub fn new() -> Self {
        BlockId(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}
