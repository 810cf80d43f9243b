//! Server renderer
//!
//! Rendering is a pure mapping from (block, attribute set, context) to
//! markup. The context carries everything a renderer may read besides the
//! attributes: the media store, the remote items state of dynamic blocks, the
//! theme configuration and the copyright year. The year is the one
//! deliberate impurity of the site footer and is therefore passed in
//! explicitly instead of being read from the clock during rendering.
//!
//! Markup itself comes from the per-block templates in [`templates`].

pub mod markup;
pub mod templates;

use chrono::Datelike;

use crate::config::ThemeConfig;
use crate::core::attribute::{AttributeSet, RawAttributes};
use crate::core::block::BlockInstance;
use crate::core::media::{ImageReference, MediaStore, ResolvedImage};
use crate::core::registry::{BlockRegistry, RegistryError};
use crate::core::schema::SchemaViolation;
use crate::core::posts::PostQuery;
use crate::editor::remote::FetchState;
use crate::serialization::{Document, Segment};

/// Server-side renderer of one block type
pub trait BlockRenderer: Send + Sync {
    /// Render hydrated attributes to markup
    fn render(&self, attributes: &AttributeSet, ctx: &RenderContext<'_>) -> String;
}

/// Renderer backed by a plain function or closure
pub struct StaticRenderer<F> {
    render: F,
}

impl<F> StaticRenderer<F>
where
    F: Fn(&AttributeSet, &RenderContext<'_>) -> String + Send + Sync,
{
    pub fn new(render: F) -> Self {
        Self { render }
    }
}

impl<F> BlockRenderer for StaticRenderer<F>
where
    F: Fn(&AttributeSet, &RenderContext<'_>) -> String + Send + Sync,
{
    fn render(&self, attributes: &AttributeSet, ctx: &RenderContext<'_>) -> String {
        (self.render)(attributes, ctx)
    }
}

/// Inputs a renderer may read besides the attributes
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub media: &'a dyn MediaStore,
    pub config: &'a ThemeConfig,
    /// Remote items of dynamic blocks, one state per fetched query
    pub remote: &'a [FetchState],
    pub copyright_year: i32,
}

impl<'a> RenderContext<'a> {
    /// Create a context with no remote items
    pub fn new(media: &'a dyn MediaStore, config: &'a ThemeConfig, copyright_year: i32) -> Self {
        Self {
            media,
            config,
            remote: &[],
            copyright_year,
        }
    }

    /// Attach the remote items state of a dynamic block
    pub fn with_remote(self, remote: &'a FetchState) -> Self {
        self.with_remote_states(std::slice::from_ref(remote))
    }

    /// Attach remote items for several dynamic blocks of one document
    pub fn with_remote_states(mut self, remote: &'a [FetchState]) -> Self {
        self.remote = remote;
        self
    }

    /// State answering `query`; `None` when nothing was fetched for it yet
    pub fn remote_for(&self, query: &PostQuery) -> Option<&'a FetchState> {
        self.remote.iter().rev().find(|state| state.query() == Some(query))
    }

    /// The current calendar year, for hosts building a context per request
    pub fn current_year() -> i32 {
        chrono::Utc::now().year()
    }

    /// Resolve an image reference to something renderable
    ///
    /// External URLs are used as-is. Media ids go through the media store;
    /// a miss means the asset is gone and the image is omitted even if a
    /// cached URL exists.
    pub fn resolve_image(&self, image: &ImageReference) -> Option<ResolvedImage> {
        self.resolve_image_at(image, &self.config.render.media_size)
    }

    /// Resolve at an explicit size variant (`"full"` for hero images)
    pub fn resolve_image_at(&self, image: &ImageReference, size: &str) -> Option<ResolvedImage> {
        match image {
            ImageReference::External { url } => Some(ResolvedImage {
                url: url.clone(),
                width: 0,
                height: 0,
            }),
            ImageReference::Media { id, .. } => {
                let resolved = self.media.resolve(*id, size);
                if resolved.is_none() {
                    tracing::warn!(media_id = id, size, "Media resolution miss, omitting image");
                }
                resolved
            }
        }
    }
}

/// Rendered markup plus the schema violations hydration recovered from
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub html: String,
    pub violations: Vec<SchemaViolation>,
}

/// Render errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// The block name is not registered
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Hydrate raw attributes and render a registered block
pub fn render_block(
    registry: &BlockRegistry,
    name: &str,
    raw: &RawAttributes,
    ctx: &RenderContext<'_>,
) -> Result<Rendered, RenderError> {
    let definition = registry.get_block(name)?;
    let hydrated = definition.hydrate(raw);
    let html = definition.renderer().render(&hydrated.attributes, ctx);
    tracing::debug!(block = %name, bytes = html.len(), "Rendered block");
    Ok(Rendered {
        html,
        violations: hydrated.violations,
    })
}

/// Render an already hydrated block instance
pub fn render_instance(
    registry: &BlockRegistry,
    instance: &BlockInstance,
    ctx: &RenderContext<'_>,
) -> Result<String, RenderError> {
    let definition = registry.get_block(&instance.name)?;
    Ok(definition.renderer().render(&instance.attributes, ctx))
}

/// Render parsed post content
///
/// Registered blocks are rendered server-side from their attributes; the
/// inner markup of unknown blocks and all free-form HTML pass through as
/// saved.
pub fn render_document(
    registry: &BlockRegistry,
    document: &Document,
    ctx: &RenderContext<'_>,
) -> String {
    let mut html = String::new();
    render_segments(registry, &document.segments, ctx, &mut html);
    html
}

fn render_segments(
    registry: &BlockRegistry,
    segments: &[Segment],
    ctx: &RenderContext<'_>,
    html: &mut String,
) {
    for segment in segments {
        match segment {
            Segment::Freeform(text) => html.push_str(text),
            Segment::Block(node) => match registry.get_block(&node.name) {
                Ok(definition) => {
                    let hydrated = definition.hydrate(&node.attributes);
                    html.push_str(&definition.renderer().render(&hydrated.attributes, ctx));
                }
                Err(_) => render_segments(registry, &node.inner, ctx, html),
            },
        }
    }
}
