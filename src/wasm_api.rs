//! WASM API: `#[wasm_bindgen]` exports used by the block editor scripts.
//!
//! This module is only compiled when targeting `wasm32`. It provides:
//! - `init_runtime` / `destroy_runtime`: lifecycle, theme registry and options
//! - `get_block_types`: discovery
//! - `open_editor` / `close_editor`: one editor session per block instance
//! - `set_attribute` / `sequence_op` / `undo` / `redo`: state transitions
//! - `apply_picked_image`: media picker results
//! - `begin_fetch` / `complete_fetch`: remote items of dynamic blocks
//! - `save_block` / `render_preview`: serialization and server markup
//!
//! Every function takes and returns JSON strings; failures are reported as
//! `{"error": "..."}`.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::blocks;
use crate::config::ThemeConfig;
use crate::core::attribute::{AttributeValue, RawAttributes};
use crate::core::media::{ImageReference, InMemoryMediaStore, ResolvedImage};
use crate::core::posts::PostRecord;
use crate::core::registry::BlockRegistry;
use crate::core::schema::SchemaViolation;
use crate::editor::{
    EditorError, EditorState, FetchTicket, ImageBinding, ImageTarget, MediaPicker, PickedImage,
    RemoteItems,
};
use crate::render::RenderContext;
use crate::serialization::{serialize_document, BlockNode, Document};

// ── Trivial async executor for WASM ─────────────────────────────────────────
//
// The only future driven here is the editor's media pick, and the picker
// handed to it already holds its answer. A noop-waker executor drives it to
// completion.

fn block_on<F: core::future::Future>(fut: F) -> F::Output {
    let mut fut = core::pin::pin!(fut);
    let waker = noop_waker();
    let mut cx = core::task::Context::from_waker(&waker);
    match fut.as_mut().poll(&mut cx) {
        core::task::Poll::Ready(result) => result,
        core::task::Poll::Pending => panic!("editor future yielded Pending in WASM context"),
    }
}

fn noop_waker() -> core::task::Waker {
    use std::task::{RawWaker, RawWakerVTable};

    fn no_op(_: *const ()) {}
    fn clone(p: *const ()) -> RawWaker {
        RawWaker::new(p, &VTABLE)
    }

    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);

    unsafe { core::task::Waker::from_raw(RawWaker::new(std::ptr::null(), &VTABLE)) }
}

// ── Global state ────────────────────────────────────────────────────────────

struct Session {
    editor: EditorState,
    remote: RemoteItems,
    tickets: HashMap<u64, FetchTicket>,
}

struct WasmRuntime {
    registry: BlockRegistry,
    config: ThemeConfig,
    sessions: HashMap<String, Session>,
    next_session: u64,
}

thread_local! {
    static RUNTIME: RefCell<Option<WasmRuntime>> = RefCell::new(None);
}

fn with_runtime<R>(f: impl FnOnce(&mut WasmRuntime) -> R) -> Result<R, String> {
    RUNTIME.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(rt) => Ok(f(rt)),
            None => Err("Runtime not initialized. Call init_runtime() first.".into()),
        }
    })
}

fn with_session<R>(
    session_id: &str,
    f: impl FnOnce(&mut Session, &WasmRuntime) -> Result<R, String>,
) -> Result<R, String> {
    with_runtime(|rt| {
        let mut session = rt
            .sessions
            .remove(session_id)
            .ok_or_else(|| format!("Unknown editor session: {}", session_id))?;
        let result = f(&mut session, rt);
        rt.sessions.insert(session_id.to_string(), session);
        result
    })?
}

// ── JSON interchange types ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum SequenceOpJson {
    Insert {
        attribute: String,
        index: usize,
        #[serde(default)]
        item: Option<serde_json::Value>,
    },
    Remove {
        attribute: String,
        index: usize,
    },
    Move {
        attribute: String,
        from: usize,
        to: usize,
    },
    Duplicate {
        attribute: String,
        index: usize,
    },
    Update {
        attribute: String,
        index: usize,
        field: String,
        value: serde_json::Value,
    },
}

#[derive(Deserialize)]
struct ImageTargetJson {
    #[serde(default)]
    attribute: Option<String>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default, rename = "urlField")]
    url_field: Option<String>,
    #[serde(default, rename = "idField")]
    id_field: Option<String>,
    #[serde(default, rename = "altField")]
    alt_field: Option<String>,
}

impl ImageTargetJson {
    fn into_target(self) -> Result<ImageTarget, String> {
        let standard = ImageBinding::standard();
        let binding = ImageBinding {
            url_field: self.url_field.unwrap_or(standard.url_field),
            id_field: self.id_field.unwrap_or(standard.id_field),
            alt_field: self.alt_field.unwrap_or(standard.alt_field),
        };
        match (self.attribute, self.index) {
            (Some(attribute), Some(index)) => Ok(ImageTarget::Item {
                attribute,
                index,
                binding,
            }),
            (None, None) => Ok(ImageTarget::Attributes(binding)),
            _ => Err("Image target needs both 'attribute' and 'index', or neither".into()),
        }
    }
}

#[derive(Deserialize)]
struct PickedImageJson {
    image: ImageReference,
    #[serde(default)]
    alt: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FetchResultJson {
    Records(Vec<PostRecord>),
    Failed { error: String },
}

// ── Response types ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct SessionResponse<'a> {
    session: &'a str,
    attributes: &'a crate::core::attribute::AttributeSet,
    #[serde(rename = "canUndo")]
    can_undo: bool,
    #[serde(rename = "canRedo")]
    can_redo: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<String>,
}

#[derive(Serialize)]
struct BlockTypeInfo {
    name: String,
    title: String,
    category: String,
    description: String,
    version: u32,
    keywords: Vec<String>,
}

#[derive(Serialize)]
struct FetchResponse<'a> {
    ticket: u64,
    query: &'a crate::core::posts::PostQuery,
}

#[derive(Serialize)]
struct AppliedResponse {
    applied: bool,
}

#[derive(Serialize)]
struct MarkupResponse {
    html: String,
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Picker whose answer is already known
struct ResolvedPicker(Option<PickedImage>);

#[async_trait]
impl MediaPicker for ResolvedPicker {
    async fn pick_image(&self) -> Option<PickedImage> {
        self.0.clone()
    }
}

fn json_value<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| json_err(e.to_string()))
}

fn json_err(msg: impl Into<String>) -> String {
    serde_json::to_string(&ErrorResponse { error: msg.into() }).unwrap_or_default()
}

fn parse<T: for<'de> Deserialize<'de>>(json: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn session_json(id: &str, editor: &EditorState, violations: &[SchemaViolation]) -> String {
    json_value(&SessionResponse {
        session: id,
        attributes: &editor.attributes(),
        can_undo: editor.can_undo(),
        can_redo: editor.can_redo(),
        violations: violations.iter().map(ToString::to_string).collect(),
    })
}

fn respond(result: Result<String, String>) -> String {
    result.unwrap_or_else(json_err)
}

fn editor_err(e: EditorError) -> String {
    e.to_string()
}

// ── Exported functions ──────────────────────────────────────────────────────

#[wasm_bindgen]
pub fn init_runtime(config_json: &str) -> String {
    console_error_panic_hook::set_once();

    let config = if config_json.trim().is_empty() {
        ThemeConfig::default()
    } else {
        match ThemeConfig::from_json_str(config_json) {
            Ok(c) => c,
            Err(e) => return json_err(e.to_string()),
        }
    };
    let registry = match blocks::theme_registry() {
        Ok(r) => r,
        Err(e) => return json_err(e.to_string()),
    };
    let count = registry.count();

    RUNTIME.with(|cell| {
        *cell.borrow_mut() = Some(WasmRuntime {
            registry,
            config,
            sessions: HashMap::new(),
            next_session: 0,
        });
    });
    json_value(&serde_json::json!({ "blocks": count }))
}

#[wasm_bindgen]
pub fn destroy_runtime() {
    RUNTIME.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

#[wasm_bindgen]
pub fn get_block_types() -> String {
    respond(with_runtime(|rt| {
        let types: Vec<BlockTypeInfo> = rt
            .registry
            .get_all_blocks()
            .iter()
            .map(|b| BlockTypeInfo {
                name: b.metadata.name.clone(),
                title: b.metadata.title.clone(),
                category: b.metadata.category.slug().to_string(),
                description: b.metadata.description.clone(),
                version: b.version,
                keywords: b.metadata.keywords.clone(),
            })
            .collect();
        json_value(&types)
    }))
}

#[wasm_bindgen]
pub fn open_editor(block_name: &str, attributes_json: &str) -> String {
    let raw = match crate::serialization::deserialize(attributes_json) {
        Ok(raw) => raw,
        Err(e) => return json_err(e.to_string()),
    };

    respond(
        with_runtime(|rt| {
            let definition = rt.registry.get_block(block_name).map_err(|e| e.to_string())?;
            let violations = definition.hydrate(&raw).violations;
            let editor = EditorState::open(definition, &raw, &rt.config.editor);

            rt.next_session += 1;
            let id = format!("editor-{}", rt.next_session);
            let response = session_json(&id, &editor, &violations);
            rt.sessions.insert(
                id,
                Session {
                    editor,
                    remote: RemoteItems::new(),
                    tickets: HashMap::new(),
                },
            );
            Ok(response)
        })
        .and_then(|r| r),
    )
}

#[wasm_bindgen]
pub fn close_editor(session_id: &str) -> bool {
    with_runtime(|rt| rt.sessions.remove(session_id).is_some()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn set_attribute(session_id: &str, key: &str, value_json: &str) -> String {
    respond(with_session(session_id, |session, _| {
        let value: serde_json::Value = parse(value_json, "value")?;
        session
            .editor
            .set(key, AttributeValue::from(value))
            .map_err(editor_err)?;
        Ok(session_json(session_id, &session.editor, &[]))
    }))
}

#[wasm_bindgen]
pub fn sequence_op(session_id: &str, op_json: &str) -> String {
    respond(with_session(session_id, |session, _| {
        let op: SequenceOpJson = parse(op_json, "sequence operation")?;
        let editor = &mut session.editor;
        let result = match op {
            SequenceOpJson::Insert {
                attribute,
                index,
                item,
            } => {
                let item = match item {
                    Some(value) => AttributeValue::from(value),
                    None if attribute == blocks::section_process::STEPS => {
                        blocks::section_process::new_step(index + 1)
                    }
                    None => AttributeValue::Object(Default::default()),
                };
                editor.insert_item(&attribute, index, item)
            }
            SequenceOpJson::Remove { attribute, index } => editor.remove_item(&attribute, index),
            SequenceOpJson::Move {
                attribute,
                from,
                to,
            } => editor.move_item(&attribute, from, to),
            SequenceOpJson::Duplicate { attribute, index } => {
                editor.duplicate_item(&attribute, index)
            }
            SequenceOpJson::Update {
                attribute,
                index,
                field,
                value,
            } => editor.update_item(&attribute, index, &field, AttributeValue::from(value)),
        };
        result.map_err(editor_err)?;
        Ok(session_json(session_id, editor, &[]))
    }))
}

#[wasm_bindgen]
pub fn undo(session_id: &str) -> String {
    respond(with_session(session_id, |session, _| {
        session.editor.undo();
        Ok(session_json(session_id, &session.editor, &[]))
    }))
}

#[wasm_bindgen]
pub fn redo(session_id: &str) -> String {
    respond(with_session(session_id, |session, _| {
        session.editor.redo();
        Ok(session_json(session_id, &session.editor, &[]))
    }))
}

/// Write an image chosen in the host's media modal; `picked_json` is `null`
/// when the modal was cancelled
#[wasm_bindgen]
pub fn apply_picked_image(session_id: &str, target_json: &str, picked_json: &str) -> String {
    respond(with_session(session_id, |session, _| {
        let target = parse::<ImageTargetJson>(target_json, "image target")?.into_target()?;
        let picked: Option<PickedImageJson> = parse(picked_json, "picked image")?;
        let picker = ResolvedPicker(picked.map(|p| PickedImage {
            reference: p.image,
            alt: p.alt,
        }));
        block_on(session.editor.pick_image(&picker, &target)).map_err(editor_err)?;
        Ok(session_json(session_id, &session.editor, &[]))
    }))
}

/// Start fetching remote items; returns the query the host should run
#[wasm_bindgen]
pub fn begin_fetch(session_id: &str) -> String {
    respond(with_session(session_id, |session, _| {
        let attributes = session.editor.attributes();
        let query = blocks::section_process::post_query(&attributes)
            .ok_or_else(|| "Block does not show remote items".to_string())?;
        let ticket = session.remote.begin(query);
        let response = json_value(&FetchResponse {
            ticket: ticket.generation(),
            query: ticket.query(),
        });
        // Only the newest ticket can still be applied.
        session.tickets.clear();
        session.tickets.insert(ticket.generation(), ticket);
        Ok(response)
    }))
}

/// Deliver the result of a fetch; stale tickets are discarded
#[wasm_bindgen]
pub fn complete_fetch(session_id: &str, ticket: u64, result_json: &str) -> String {
    respond(with_session(session_id, |session, _| {
        let result: FetchResultJson = parse(result_json, "fetch result")?;
        let applied = match session.tickets.remove(&ticket) {
            Some(ticket) => {
                let result = match result {
                    FetchResultJson::Records(records) => Ok(records),
                    FetchResultJson::Failed { error } => Err(error),
                };
                session.remote.complete(&ticket, result)
            }
            None => false,
        };
        Ok(json_value(&AppliedResponse { applied }))
    }))
}

/// Block comment markup for the current attributes
#[wasm_bindgen]
pub fn save_block(session_id: &str) -> String {
    respond(with_session(session_id, |session, rt| {
        let mut document = Document::default();
        document.push_block(BlockNode::from(&session.editor.to_instance()));
        let html = serialize_document(&document, &rt.registry).map_err(|e| e.to_string())?;
        Ok(json_value(&MarkupResponse { html }))
    }))
}

/// Server markup for the current attributes
///
/// `media_json` maps media ids to `{url, width, height}` as known to the
/// editor. A `year` of 0 means the browser's current year.
#[wasm_bindgen]
pub fn render_preview(session_id: &str, year: i32, media_json: &str) -> String {
    let year = if year > 0 {
        year
    } else {
        js_sys::Date::new_0().get_full_year() as i32
    };
    respond(with_session(session_id, |session, rt| {
        let media = InMemoryMediaStore::new();
        if !media_json.trim().is_empty() {
            let known: HashMap<u64, ResolvedImage> = parse(media_json, "media")?;
            for (id, image) in known {
                media.insert(id, rt.config.render.media_size.clone(), image.clone());
                media.insert(id, "full", image);
            }
        }
        let remote = session.remote.state();
        let ctx = RenderContext::new(&media, &rt.config, year).with_remote(&remote);
        let raw: RawAttributes = session.editor.raw_attributes();
        let rendered =
            crate::render::render_block(&rt.registry, session.editor.definition().name(), &raw, &ctx)
                .map_err(|e| e.to_string())?;
        Ok(json_value(&MarkupResponse {
            html: rendered.html,
        }))
    }))
}
