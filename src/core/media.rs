//! Image references and the media store interface
//!
//! Blocks reference images either by external URL or by media id. A media id
//! is a foreign key into an external media library and is resolved at render
//! time; the cached URL stored next to it may be stale.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::attribute::AttributeValue;

/// Reference to an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageReference {
    /// Plain URL outside the media library
    External { url: String },
    /// Media library item with the last URL it resolved to
    Media {
        id: u64,
        resolved_url: Option<String>,
    },
}

impl ImageReference {
    /// Read a reference from a record's url/id fields
    ///
    /// A positive id wins over the url; `0`, `null` and a missing id mean
    /// "no media item". Returns `None` when neither is present.
    pub fn from_fields(url: &str, id: Option<&AttributeValue>) -> Option<Self> {
        let media_id = id
            .and_then(AttributeValue::as_integer)
            .filter(|id| *id > 0)
            .map(|id| id as u64);

        match media_id {
            Some(id) => Some(ImageReference::Media {
                id,
                resolved_url: (!url.is_empty()).then(|| url.to_string()),
            }),
            None if !url.is_empty() => Some(ImageReference::External {
                url: url.to_string(),
            }),
            None => None,
        }
    }

    /// Media id, if this is a library reference
    pub fn media_id(&self) -> Option<u64> {
        match self {
            ImageReference::Media { id, .. } => Some(*id),
            ImageReference::External { .. } => None,
        }
    }

    /// Best known URL without consulting the media store
    pub fn cached_url(&self) -> Option<&str> {
        match self {
            ImageReference::External { url } => Some(url),
            ImageReference::Media { resolved_url, .. } => resolved_url.as_deref(),
        }
    }
}

/// Image resolved by the media store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Media library interface
///
/// `resolve` returns `None` when the id is stale or deleted; renderers treat
/// that as "no image".
pub trait MediaStore: Send + Sync {
    /// Resolve a media id at a named size variant (`"large"`, `"full"`, ...)
    fn resolve(&self, media_id: u64, size: &str) -> Option<ResolvedImage>;
}

/// Media store with no items; every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMedia;

impl MediaStore for NoMedia {
    fn resolve(&self, _media_id: u64, _size: &str) -> Option<ResolvedImage> {
        None
    }
}

/// In-memory media library keyed by id and size variant
#[derive(Clone, Default)]
pub struct InMemoryMediaStore {
    items: Arc<RwLock<HashMap<u64, HashMap<String, ResolvedImage>>>>,
}

impl InMemoryMediaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a size variant of a media item
    pub fn insert(&self, media_id: u64, size: impl Into<String>, image: ResolvedImage) {
        self.items
            .write()
            .entry(media_id)
            .or_default()
            .insert(size.into(), image);
    }

    /// Delete a media item and all its variants
    pub fn delete(&self, media_id: u64) -> bool {
        self.items.write().remove(&media_id).is_some()
    }
}

impl MediaStore for InMemoryMediaStore {
    fn resolve(&self, media_id: u64, size: &str) -> Option<ResolvedImage> {
        let items = self.items.read();
        let variants = items.get(&media_id)?;
        // WordPress falls back to the full-size original for unknown variants.
        variants.get(size).or_else(|| variants.get("full")).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str) -> ResolvedImage {
        ResolvedImage {
            url: url.into(),
            width: 800,
            height: 600,
        }
    }

    #[test]
    fn test_reference_from_fields() {
        assert_eq!(ImageReference::from_fields("", None), None);
        assert_eq!(
            ImageReference::from_fields("https://x/a.jpg", Some(&AttributeValue::Null)),
            Some(ImageReference::External {
                url: "https://x/a.jpg".into()
            })
        );
        assert_eq!(
            ImageReference::from_fields("https://x/a.jpg", Some(&AttributeValue::Integer(0))),
            Some(ImageReference::External {
                url: "https://x/a.jpg".into()
            })
        );

        let media = ImageReference::from_fields("", Some(&AttributeValue::Integer(42))).unwrap();
        assert_eq!(media.media_id(), Some(42));
        assert_eq!(media.cached_url(), None);
    }

    #[test]
    fn test_store_resolution_and_delete() {
        let store = InMemoryMediaStore::new();
        store.insert(7, "full", image("https://cdn/7.jpg"));
        store.insert(7, "large", image("https://cdn/7-large.jpg"));

        assert_eq!(store.resolve(7, "large").unwrap().url, "https://cdn/7-large.jpg");
        assert_eq!(store.resolve(7, "thumbnail").unwrap().url, "https://cdn/7.jpg");
        assert!(store.resolve(8, "large").is_none());

        assert!(store.delete(7));
        assert!(store.resolve(7, "large").is_none());
    }
}
