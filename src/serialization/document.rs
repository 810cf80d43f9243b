//! Host document format
//!
//! Post content is HTML with blocks delimited by comments:
//!
//! ```text
//! <!-- wp:julianboelen/section-process {"sectionTitle":"Ons proces"} /-->
//! <!-- wp:paragraph --><p>Hallo</p><!-- /wp:paragraph -->
//! ```
//!
//! Names without a namespace belong to `core/`. Everything between blocks is
//! free-form HTML and is kept verbatim. Saving writes only the attributes
//! that differ from their schema default; keys the schema does not know and
//! blocks the registry does not know are written back exactly as they were
//! read, so re-saving a document never loses content written by a newer
//! version of a block.

use crate::core::attribute::{AttributeValue, RawAttributes};
use crate::core::block::BlockInstance;
use crate::core::registry::BlockRegistry;

use super::{json_kind, SerializationError};

const CORE_NAMESPACE: &str = "core/";

/// Document parse errors
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// An opening delimiter without its closer
    #[error("Block '{name}' opened at byte {offset} is never closed")]
    UnterminatedBlock { name: String, offset: usize },

    /// A closer that does not match the innermost open block
    #[error("Unexpected closer for '{name}' at byte {offset}")]
    UnexpectedCloser { name: String, offset: usize },

    /// A block comment that does not end in `-->` or `/-->`
    #[error("Malformed block delimiter at byte {offset}")]
    MalformedDelimiter { offset: usize },

    /// Attribute JSON of a block could not be read
    #[error("Invalid attributes for '{name}': {message}")]
    InvalidAttributes { name: String, message: String },

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

/// A parsed block with its inner content
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    /// Fully qualified name (`core/paragraph`)
    pub name: String,
    pub attributes: RawAttributes,
    /// Inner HTML and nested blocks; empty for self-closing blocks
    pub inner: Vec<Segment>,
}

impl BlockNode {
    /// Create a self-closing block
    pub fn new(name: impl Into<String>, attributes: RawAttributes) -> Self {
        Self {
            name: qualify(&name.into()),
            attributes,
            inner: Vec::new(),
        }
    }

    /// Nested blocks, depth first
    pub fn descendants(&self) -> Vec<&BlockNode> {
        let mut found = Vec::new();
        collect_blocks(&self.inner, &mut found);
        found
    }
}

impl From<&BlockInstance> for BlockNode {
    fn from(instance: &BlockInstance) -> Self {
        BlockNode::new(instance.name.clone(), instance.raw_attributes())
    }
}

/// Piece of a document
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Block(BlockNode),
    /// HTML outside any block delimiter
    Freeform(String),
}

/// Parsed post content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub segments: Vec<Segment>,
}

impl Document {
    /// Top-level blocks in document order
    pub fn blocks(&self) -> impl Iterator<Item = &BlockNode> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Block(node) => Some(node),
            Segment::Freeform(_) => None,
        })
    }

    /// Every block including nested ones, depth first
    pub fn all_blocks(&self) -> Vec<&BlockNode> {
        let mut found = Vec::new();
        collect_blocks(&self.segments, &mut found);
        found
    }

    /// Replace the attributes of the `index`-th top-level block
    ///
    /// Only that block changes; every other segment keeps its exact content.
    /// Returns `false` when there is no such block.
    pub fn set_block_attributes(&mut self, index: usize, attributes: RawAttributes) -> bool {
        let node = self
            .segments
            .iter_mut()
            .filter_map(|segment| match segment {
                Segment::Block(node) => Some(node),
                Segment::Freeform(_) => None,
            })
            .nth(index);
        match node {
            Some(node) => {
                node.attributes = attributes;
                true
            }
            None => false,
        }
    }

    /// Append a block
    pub fn push_block(&mut self, node: BlockNode) {
        self.segments.push(Segment::Block(node));
    }
}

fn collect_blocks<'a>(segments: &'a [Segment], found: &mut Vec<&'a BlockNode>) {
    for segment in segments {
        if let Segment::Block(node) = segment {
            found.push(node);
            collect_blocks(&node.inner, found);
        }
    }
}

fn qualify(name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("{}{}", CORE_NAMESPACE, name)
    }
}

enum Delimiter {
    Opener {
        name: String,
        attributes: RawAttributes,
        void: bool,
    },
    Closer {
        name: String,
    },
}

struct Frame {
    node: BlockNode,
    offset: usize,
}

/// Parse post content into blocks and free-form HTML
pub fn parse_document(input: &str) -> Result<Document, DocumentError> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while let Some(found) = input[pos..].find("<!--") {
        let start = pos + found;
        let Some((delimiter, end)) = read_delimiter(input, start)? else {
            // Ordinary HTML comment, part of the free-form text.
            pos = start + 4;
            continue;
        };

        let children = match stack.last_mut() {
            Some(frame) => &mut frame.node.inner,
            None => &mut root,
        };
        if start > text_start {
            children.push(Segment::Freeform(input[text_start..start].to_string()));
        }

        match delimiter {
            Delimiter::Opener {
                name,
                attributes,
                void: true,
            } => children.push(Segment::Block(BlockNode {
                name,
                attributes,
                inner: Vec::new(),
            })),
            Delimiter::Opener {
                name, attributes, ..
            } => stack.push(Frame {
                node: BlockNode {
                    name,
                    attributes,
                    inner: Vec::new(),
                },
                offset: start,
            }),
            Delimiter::Closer { name } => {
                let frame = match stack.pop() {
                    Some(frame) if frame.node.name == name => frame,
                    _ => return Err(DocumentError::UnexpectedCloser { name, offset: start }),
                };
                let parent = match stack.last_mut() {
                    Some(parent) => &mut parent.node.inner,
                    None => &mut root,
                };
                parent.push(Segment::Block(frame.node));
            }
        }

        pos = end;
        text_start = end;
    }

    if let Some(frame) = stack.pop() {
        return Err(DocumentError::UnterminatedBlock {
            name: frame.node.name,
            offset: frame.offset,
        });
    }
    if text_start < input.len() {
        root.push(Segment::Freeform(input[text_start..].to_string()));
    }

    tracing::debug!(segments = root.len(), bytes = input.len(), "Parsed document");
    Ok(Document { segments: root })
}

/// Read a block delimiter starting at the `<!--` at `start`
///
/// Returns `None` for comments that are not block delimiters, otherwise the
/// delimiter and the byte offset just past it.
fn read_delimiter(input: &str, start: usize) -> Result<Option<(Delimiter, usize)>, DocumentError> {
    let mut i = skip_whitespace(input, start + 4);
    let rest = &input[i..];
    let closer = if rest.starts_with("/wp:") {
        i += 4;
        true
    } else if rest.starts_with("wp:") {
        i += 3;
        false
    } else {
        return Ok(None);
    };

    let name_len = input[i..]
        .find(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '/')))
        .unwrap_or(input.len() - i);
    let raw_name = &input[i..i + name_len];
    if raw_name.is_empty() || raw_name.matches('/').count() > 1 {
        return Ok(None);
    }
    let name = qualify(raw_name);
    i = skip_whitespace(input, i + name_len);

    if closer {
        if !input[i..].starts_with("-->") {
            return Err(DocumentError::MalformedDelimiter { offset: start });
        }
        return Ok(Some((Delimiter::Closer { name }, i + 3)));
    }

    let mut attributes = RawAttributes::new();
    if input[i..].starts_with('{') {
        let mut stream =
            serde_json::Deserializer::from_str(&input[i..]).into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(serde_json::Value::Object(fields))) => {
                attributes = fields
                    .into_iter()
                    .map(|(key, value)| (key, AttributeValue::from(value)))
                    .collect();
            }
            Some(Ok(other)) => {
                return Err(DocumentError::InvalidAttributes {
                    name,
                    message: format!("expected an object, found {}", json_kind(&other)),
                })
            }
            Some(Err(e)) => {
                return Err(DocumentError::InvalidAttributes {
                    name,
                    message: e.to_string(),
                })
            }
            None => return Err(DocumentError::MalformedDelimiter { offset: start }),
        }
        i = skip_whitespace(input, i + stream.byte_offset());
    }

    let rest = &input[i..];
    if rest.starts_with("/-->") {
        Ok(Some((
            Delimiter::Opener {
                name,
                attributes,
                void: true,
            },
            i + 4,
        )))
    } else if rest.starts_with("-->") {
        Ok(Some((
            Delimiter::Opener {
                name,
                attributes,
                void: false,
            },
            i + 3,
        )))
    } else {
        Err(DocumentError::MalformedDelimiter { offset: start })
    }
}

fn skip_whitespace(input: &str, from: usize) -> usize {
    input[from..]
        .find(|c: char| !c.is_ascii_whitespace())
        .map_or(input.len(), |n| from + n)
}

/// Serialize a document back to post content
///
/// Known blocks are written in compact form: attributes equal to their
/// schema default are left out.
pub fn serialize_document(
    document: &Document,
    registry: &BlockRegistry,
) -> Result<String, DocumentError> {
    let mut out = String::new();
    write_segments(&document.segments, registry, &mut out)?;
    Ok(out)
}

fn write_segments(
    segments: &[Segment],
    registry: &BlockRegistry,
    out: &mut String,
) -> Result<(), DocumentError> {
    for segment in segments {
        match segment {
            Segment::Freeform(html) => out.push_str(html),
            Segment::Block(node) => write_block(node, registry, out)?,
        }
    }
    Ok(())
}

fn write_block(
    node: &BlockNode,
    registry: &BlockRegistry,
    out: &mut String,
) -> Result<(), DocumentError> {
    let name = node.name.strip_prefix(CORE_NAMESPACE).unwrap_or(&node.name);
    let attributes = compact_attributes(node, registry);

    out.push_str("<!-- wp:");
    out.push_str(name);
    if !attributes.is_empty() {
        out.push(' ');
        out.push_str(&escape_comment_json(&super::serialize_raw(&attributes)?));
    }

    if node.inner.is_empty() {
        out.push_str(" /-->");
        return Ok(());
    }
    out.push_str(" -->");
    write_segments(&node.inner, registry, out)?;
    out.push_str("<!-- /wp:");
    out.push_str(name);
    out.push_str(" -->");
    Ok(())
}

fn compact_attributes(node: &BlockNode, registry: &BlockRegistry) -> RawAttributes {
    let Ok(definition) = registry.get_block(&node.name) else {
        return node.attributes.clone();
    };
    node.attributes
        .iter()
        .filter(|(key, value)| {
            definition
                .schema
                .attribute(key)
                .map_or(true, |spec| spec.default != **value)
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Make JSON safe to embed in an HTML comment
fn escape_comment_json(json: &str) -> String {
    json.replace("--", "\\u002d\\u002d")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}
