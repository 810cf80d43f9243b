//! Content Blocks - Block attribute and rendering contract
//!
//! This crate provides typed attribute schemas for content blocks, the
//! editor-side state controller, the serialization layer for attribute sets
//! and post content, and a pure server renderer. The editor (through the
//! WASM surface) and the server share this one implementation.

pub mod core;
pub mod editor;
pub mod serialization;
pub mod render;
pub mod blocks;
pub mod config;
mod tests;

#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

// Re-export commonly used types
pub use core::{
    AttributeSet, AttributeValue, BlockDefinition, BlockId, BlockInstance, BlockRegistry,
    RawAttributes, RegistryError, SchemaViolation,
};
pub use config::ThemeConfig;
pub use editor::{EditorError, EditorState};
pub use render::{render_block, render_document, RenderContext, RenderError, Rendered};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
