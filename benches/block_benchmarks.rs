//! Criterion benchmarks for block attribute handling.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the hot paths of the contract: hydration of
//! stored attributes, server rendering, structural editor operations and
//! parsing/serializing post content, at a few sequence sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::sync::Arc;

use content_blocks::blocks::section_process::{self, STEPS};
use content_blocks::blocks::theme_registry;
use content_blocks::config::{EditorConfig, ThemeConfig};
use content_blocks::core::media::NoMedia;
use content_blocks::editor::EditorState;
use content_blocks::render::{render_block, render_document, RenderContext};
use content_blocks::serialization::{self, parse_document, serialize_document};
use content_blocks::RawAttributes;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn steps_raw(count: usize) -> RawAttributes {
    let steps: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "id": format!("step-{}", i),
                "title": format!("Stap {}", i + 1),
                "description": "Solliciteer door jouw CV op te sturen.",
                "imageUrl": "https://images.example/step.jpg",
                "imageId": null
            })
        })
        .collect();
    let value = json!({ "dataSource": "custom", "sectionTitle": "Ons proces", "processSteps": steps });
    serialization::deserialize(&value.to_string()).unwrap()
}

fn post_content(blocks: usize) -> String {
    let attributes = serialization::serialize_raw(&steps_raw(4)).unwrap();
    (0..blocks)
        .map(|i| {
            format!(
                "<!-- wp:paragraph --><p>Paragraaf {}</p><!-- /wp:paragraph -->\n<!-- wp:julianboelen/section-process {} /-->\n",
                i, attributes
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Hydration
// ---------------------------------------------------------------------------

fn bench_hydrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydrate");
    let definition = section_process::definition();

    for count in [4, 16, 64] {
        let raw = steps_raw(count);
        group.bench_with_input(BenchmarkId::new("steps", count), &raw, |b, raw| {
            b.iter(|| black_box(definition.hydrate(raw)));
        });
    }

    let empty = RawAttributes::new();
    group.bench_function("defaults", |b| {
        b.iter(|| black_box(definition.hydrate(&empty)));
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let registry = theme_registry().unwrap();
    let config = ThemeConfig::default();
    let ctx = RenderContext::new(&NoMedia, &config, 2025);

    for count in [4, 16, 64] {
        let raw = steps_raw(count);
        group.bench_with_input(BenchmarkId::new("section_process", count), &raw, |b, raw| {
            b.iter(|| black_box(render_block(&registry, section_process::NAME, raw, &ctx).unwrap()));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

fn bench_editor_ops(c: &mut Criterion) {
    let definition = Arc::new(section_process::definition());
    let raw = steps_raw(32);

    c.bench_function("editor_move_item_32", |b| {
        let mut editor = EditorState::open(Arc::clone(&definition), &raw, &EditorConfig::default());
        b.iter(|| black_box(editor.move_item(STEPS, 0, 31).unwrap()));
    });

    c.bench_function("editor_insert_remove_32", |b| {
        let mut editor = EditorState::open(Arc::clone(&definition), &raw, &EditorConfig::default());
        b.iter(|| {
            editor.insert_item(STEPS, 16, section_process::new_step(17)).unwrap();
            black_box(editor.remove_item(STEPS, 16).unwrap())
        });
    });
}

// ---------------------------------------------------------------------------
// Post content
// ---------------------------------------------------------------------------

fn bench_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");
    let registry = theme_registry().unwrap();
    let config = ThemeConfig::default();
    let ctx = RenderContext::new(&NoMedia, &config, 2025);

    for blocks in [1, 10, 50] {
        let content = post_content(blocks);
        group.bench_with_input(BenchmarkId::new("parse", blocks), &content, |b, content| {
            b.iter(|| black_box(parse_document(content).unwrap()));
        });

        let doc = parse_document(&content).unwrap();
        group.bench_with_input(BenchmarkId::new("serialize", blocks), &doc, |b, doc| {
            b.iter(|| black_box(serialize_document(doc, &registry).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("render", blocks), &doc, |b, doc| {
            b.iter(|| black_box(render_document(&registry, doc, &ctx)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_hydrate,
    bench_render,
    bench_editor_ops,
    bench_document,
);
criterion_main!(benches);
