//! Section Process block
//!
//! A grid of numbered process steps. Steps come either from the block's own
//! `processSteps` sequence (`dataSource = "custom"`) or from Process Step
//! posts (`dataSource = "posts"`), which the host fetches through the post
//! store and hands to the renderer as the context's remote items.
//!
//! Schema versions:
//! - v1: the custom-steps-only variant; item media ids default to `0`
//! - v2: adds the data source and post query attributes; item media ids are
//!   `null` when unset

use minijinja::context;
use serde::Serialize;
use std::sync::Arc;

use super::{metadata, sections_category};
use crate::core::attribute::{AttributeSet, AttributeValue, RawAttributes};
use crate::core::block::{has_attribute, BlockDefinition, Deprecation};
use crate::core::media::{ImageReference, ResolvedImage};
use crate::core::posts::{Order, OrderBy, PostQuery, PostRecord, PROCESS_STEP_POST_TYPE};
use crate::core::schema::{zero_pad, AttributeSpec, BlockSchema, SequenceSpec};
use crate::editor::remote::FetchState;
use crate::render::markup::strip_tags;
use crate::render::{templates, BlockRenderer, RenderContext};

/// Block name
pub const NAME: &str = "julianboelen/section-process";

/// Sequence attribute holding the custom steps
pub const STEPS: &str = "processSteps";

/// Rendered when the custom sequence has no displayable step
pub const EMPTY_STATE: &str = "No process steps have been added yet.";

const DEFAULT_TITLE: &str = "Een gestroomlijnd proces";
const DEFAULT_DESCRIPTION: &str = "Solliciteer door jouw CV of Linkedin profiel op te sturen of direct op een vacature te reageren.";
const STEP_IMAGE: &str = "https://images.unsplash.com/photo-1595147389795-37094173bfd8?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=800&h=600&fit=crop";
const MEETING_IMAGE: &str = "https://images.unsplash.com/photo-1488372759477-a7f4aa078cb6?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=800&h=600&fit=crop";
const NEW_STEP_IMAGE: &str = "https://images.unsplash.com/photo-1595147389795-37094173bfd8?w=800&h=600&fit=crop";

/// Zero-pad width of step numbers, custom and post-backed alike
pub const STEP_NUMBER_WIDTH: usize = 2;

const SIZES: &[&str] = &["none", "sm", "md", "lg", "xl", "2xl"];
const V2_ONLY: [&str; 4] = ["dataSource", "postsToShow", "orderBy", "order"];

fn step(index: usize, title: &str, alt: &str, image: &str) -> AttributeValue {
    AttributeValue::object([
        ("id", AttributeValue::from(format!("step-{}", index))),
        ("stepNumber", AttributeValue::from(zero_pad(index, STEP_NUMBER_WIDTH))),
        ("title", title.into()),
        ("description", DEFAULT_DESCRIPTION.into()),
        ("imageUrl", image.into()),
        ("imageAlt", alt.into()),
        ("imageId", AttributeValue::Null),
    ])
}

fn default_steps() -> Vec<AttributeValue> {
    vec![
        step(1, "Solliciteren", "Solliciteren", STEP_IMAGE),
        step(2, "Profiel opstellen", "Profiel opstellen", STEP_IMAGE),
        step(3, "Op gesprek", "Op gesprek", MEETING_IMAGE),
        step(4, "Aan de slag!", "Aan de slag", STEP_IMAGE),
    ]
}

/// Item schema of `processSteps`
pub fn step_sequence(image_id: AttributeSpec) -> SequenceSpec {
    SequenceSpec::new(vec![
        AttributeSpec::string("id", ""),
        AttributeSpec::string("stepNumber", ""),
        AttributeSpec::string("title", ""),
        AttributeSpec::string("description", ""),
        AttributeSpec::string("imageUrl", ""),
        AttributeSpec::string("imageAlt", ""),
        image_id,
    ])
    .with_id_prefix("step")
    .with_order_field("stepNumber", STEP_NUMBER_WIDTH)
    .non_empty()
}

fn presentation_attributes() -> Vec<AttributeSpec> {
    vec![
        AttributeSpec::string("sectionTitle", DEFAULT_TITLE),
        AttributeSpec::string("backgroundColor", "#f9fafb"),
        AttributeSpec::string("titleColor", "#111827"),
        AttributeSpec::string("cardBackgroundColor", "#ffffff"),
        AttributeSpec::string("cardTextColor", "#374151"),
        AttributeSpec::string("cardTitleColor", "#111827"),
        AttributeSpec::boolean("enableHoverEffect", true),
        AttributeSpec::integer("columnsDesktop", 4).range(1.0, 6.0),
        AttributeSpec::integer("columnsTablet", 2).range(1.0, 4.0),
        AttributeSpec::integer("columnsMobile", 1).range(1.0, 2.0),
        AttributeSpec::string("cardGap", "6").one_of(&["2", "4", "6", "8", "12"]),
        AttributeSpec::string("paddingTop", "12"),
        AttributeSpec::string("paddingBottom", "12"),
        AttributeSpec::string("titleMarginBottom", "8"),
        AttributeSpec::string("cardBorderRadius", "lg").one_of(&["none", "sm", "md", "lg", "xl", "2xl", "full"]),
        AttributeSpec::string("imageBorderRadius", "none").one_of(&["none", "sm", "md", "lg", "xl"]),
        AttributeSpec::string("shadowStyle", "md").one_of(SIZES),
        AttributeSpec::string("hoverShadowStyle", "lg").one_of(SIZES),
    ]
}

fn schema_v1() -> BlockSchema {
    let mut attributes = presentation_attributes();
    let mut steps = default_steps();
    for item in &mut steps {
        if let AttributeValue::Object(fields) = item {
            fields.insert("imageId".into(), AttributeValue::Integer(0));
        }
    }
    attributes.push(AttributeSpec::sequence(
        STEPS,
        step_sequence(AttributeSpec::integer("imageId", 0)),
        steps,
    ));
    BlockSchema::new(attributes)
        .with_supports()
        .with_empty_state(EMPTY_STATE)
}

/// Current schema
pub fn schema() -> BlockSchema {
    let mut attributes = presentation_attributes();
    attributes.extend([
        AttributeSpec::string("dataSource", "custom").one_of(&["custom", "posts"]),
        AttributeSpec::integer("postsToShow", 4).range(1.0, 12.0),
        AttributeSpec::string("orderBy", "menu_order").one_of(&["menu_order", "date", "title"]),
        AttributeSpec::string("order", "ASC").one_of(&["ASC", "DESC"]),
        AttributeSpec::sequence(
            STEPS,
            step_sequence(AttributeSpec::optional_id("imageId")),
            default_steps(),
        ),
    ]);
    BlockSchema::new(attributes)
        .with_supports()
        .with_empty_state(EMPTY_STATE)
}

/// v1 wrote `0` for steps without media; v2 never does
fn saved_by_v1(raw: &RawAttributes) -> bool {
    if !has_attribute(raw, STEPS) || V2_ONLY.iter().any(|key| raw.contains_key(*key)) {
        return false;
    }
    raw[STEPS].as_array().is_some_and(|items| {
        items
            .iter()
            .any(|item| item.field("imageId").and_then(AttributeValue::as_integer) == Some(0))
    })
}

fn migrate_v1(old: AttributeSet) -> AttributeSet {
    let steps: Vec<AttributeValue> = old
        .items(STEPS)
        .iter()
        .cloned()
        .map(|mut item| {
            if let AttributeValue::Object(fields) = &mut item {
                if fields.get("imageId").and_then(AttributeValue::as_integer) == Some(0) {
                    fields.insert("imageId".into(), AttributeValue::Null);
                }
            }
            item
        })
        .collect();
    old.with(STEPS, steps).with("dataSource", "custom")
}

/// Block definition
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        metadata(
            "section-process",
            "Section Process",
            "A streamlined process section with numbered steps",
            sections_category(),
            "list-view",
            &["process", "steps", "workflow", "timeline"],
        ),
        schema(),
        Arc::new(SectionProcessRenderer),
    )
    .with_version(2)
    .with_deprecation(Deprecation {
        version: 1,
        schema: schema_v1(),
        is_eligible: saved_by_v1,
        migrate: migrate_v1,
    })
}

/// Template for a step added in the editor at 1-based `position`
pub fn new_step(position: usize) -> AttributeValue {
    let number = zero_pad(position, STEP_NUMBER_WIDTH);
    AttributeValue::object([
        ("title", AttributeValue::from(format!("Step {}", number))),
        ("description", "Enter step description here.".into()),
        ("imageUrl", NEW_STEP_IMAGE.into()),
        ("imageAlt", AttributeValue::from(format!("Step {}", number))),
        ("imageId", AttributeValue::Null),
    ])
}

/// Whether the block shows Process Step posts
pub fn uses_posts(attributes: &AttributeSet) -> bool {
    attributes.str("dataSource") == "posts"
}

/// Post store query of a block in posts mode
pub fn post_query(attributes: &AttributeSet) -> Option<PostQuery> {
    if !uses_posts(attributes) {
        return None;
    }
    Some(PostQuery {
        post_type: PROCESS_STEP_POST_TYPE.into(),
        per_page: attributes.integer("postsToShow").unwrap_or(4).max(1) as usize,
        order_by: OrderBy::parse(attributes.str("orderBy")).unwrap_or(OrderBy::MenuOrder),
        order: Order::parse(attributes.str("order")).unwrap_or(Order::Asc),
    })
}

/// A step ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub number: String,
    pub title: String,
    pub description: String,
    pub image: Option<ImageReference>,
    pub image_alt: String,
}

/// Displayable custom steps; steps without a title are skipped
pub fn steps_from_attributes(attributes: &AttributeSet) -> Vec<StepView> {
    attributes
        .items(STEPS)
        .iter()
        .filter(|item| !item.field_str("title").is_empty())
        .map(|item| {
            let title = item.field_str("title");
            let alt = item.field_str("imageAlt");
            StepView {
                number: item.field_str("stepNumber").to_string(),
                title: title.to_string(),
                description: item.field_str("description").to_string(),
                image: ImageReference::from_fields(item.field_str("imageUrl"), item.field("imageId")),
                image_alt: (if alt.is_empty() { title } else { alt }).to_string(),
            }
        })
        .collect()
}

/// Steps for Process Step posts, numbered by their position in the result
pub fn steps_from_posts(records: &[PostRecord]) -> Vec<StepView> {
    records
        .iter()
        .filter(|record| !record.title.is_empty())
        .enumerate()
        .map(|(index, record)| StepView {
            number: zero_pad(index + 1, STEP_NUMBER_WIDTH),
            title: record.title.clone(),
            description: strip_tags(&record.excerpt),
            image: record
                .featured_media
                .filter(|id| *id > 0)
                .map(|id| ImageReference::Media { id, resolved_url: None }),
            image_alt: record
                .featured_media_alt
                .clone()
                .filter(|alt| !alt.is_empty())
                .unwrap_or_else(|| record.title.clone()),
        })
        .collect()
}

/// Server renderer of the Section Process block
pub struct SectionProcessRenderer;

/// A step with its image resolved, as the template sees it
#[derive(Debug, Serialize)]
struct StepCard<'a> {
    number: &'a str,
    title: &'a str,
    description: &'a str,
    image: Option<ResolvedImage>,
    image_alt: &'a str,
}

/// Message shown instead of the step grid
#[derive(Debug, Serialize)]
struct Placeholder<'a> {
    kind: &'static str,
    role: Option<&'static str>,
    message: &'a str,
}

impl<'a> Placeholder<'a> {
    fn new(kind: &'static str, role: Option<&'static str>, message: &'a str) -> Self {
        Self { kind, role, message }
    }
}

impl BlockRenderer for SectionProcessRenderer {
    fn render(&self, attributes: &AttributeSet, ctx: &RenderContext<'_>) -> String {
        let texts = &ctx.config.render;
        let (steps, empty_text) = match post_query(attributes) {
            None => (steps_from_attributes(attributes), EMPTY_STATE),
            Some(query) => match ctx.remote_for(&query) {
                Some(FetchState::Loaded { records, .. }) => {
                    let shown = &records[..records.len().min(query.per_page)];
                    (steps_from_posts(shown), texts.no_items_text.as_str())
                }
                Some(FetchState::Failed { .. }) => {
                    let failed = Placeholder::new("error", Some("alert"), &texts.fetch_failed_text);
                    return render_section(attributes, &[], Some(failed));
                }
                // Nothing has been fetched for this block's query yet.
                None | Some(FetchState::Idle | FetchState::Loading(_)) => {
                    let loading = Placeholder::new("loading", Some("status"), &texts.loading_text);
                    return render_section(attributes, &[], Some(loading));
                }
            },
        };

        if steps.is_empty() {
            let empty = Placeholder::new("empty", None, empty_text);
            return render_section(attributes, &[], Some(empty));
        }
        render_section(attributes, &step_cards(&steps, ctx), None)
    }
}

fn render_section(
    attributes: &AttributeSet,
    steps: &[StepCard<'_>],
    placeholder: Option<Placeholder<'_>>,
) -> String {
    templates::render(
        "section_process.html",
        context! {
            attrs => attributes,
            steps,
            placeholder,
        },
    )
}

fn step_cards<'a>(steps: &'a [StepView], ctx: &RenderContext<'_>) -> Vec<StepCard<'a>> {
    steps
        .iter()
        .map(|step| StepCard {
            number: &step.number,
            title: &step.title,
            description: &step.description,
            image: step.image.as_ref().and_then(|image| ctx.resolve_image(image)),
            image_alt: &step.image_alt,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;
    use crate::core::media::{InMemoryMediaStore, NoMedia};
    use crate::render::templates::escape_html;
    use chrono::{TimeZone, Utc};

    fn render(attributes: &AttributeSet, remote: &FetchState) -> String {
        let config = ThemeConfig::default();
        let ctx = RenderContext::new(&NoMedia, &config, 2025).with_remote(remote);
        SectionProcessRenderer.render(attributes, &ctx)
    }

    fn post(id: u64, title: &str) -> PostRecord {
        PostRecord {
            id,
            post_type: PROCESS_STEP_POST_TYPE.into(),
            title: title.into(),
            excerpt: format!("<p>About {}</p>", title),
            menu_order: 0,
            date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            featured_media: None,
            featured_media_alt: None,
            meta: Default::default(),
        }
    }

    #[test]
    fn test_definition_is_valid() {
        assert!(definition().validate().is_ok());
    }

    #[test]
    fn test_defaults_render_four_numbered_steps() {
        let attributes = schema().defaults();
        let html = render(&attributes, &FetchState::Idle);

        assert_eq!(html.matches("<article").count(), 4);
        assert!(html.contains("01. Solliciteren"));
        assert!(html.contains("04. Aan de slag!"));
        assert!(html.contains("grid-cols-1 sm:grid-cols-2 lg:grid-cols-4"));
        assert!(html.contains("hover:shadow-lg"));
    }

    #[test]
    fn test_untitled_steps_are_skipped() {
        let defaults = schema().defaults();
        let steps = vec![
            AttributeValue::object([("title", ""), ("stepNumber", "01")]),
            AttributeValue::object([("title", "Kept"), ("stepNumber", "02")]),
        ];
        let html = render(&defaults.with(STEPS, steps), &FetchState::Idle);
        assert_eq!(html.matches("<article").count(), 1);

        let untitled = vec![AttributeValue::object([("title", "")])];
        let html = render(&defaults.with(STEPS, untitled), &FetchState::Idle);
        assert!(html.contains(EMPTY_STATE));
    }

    fn loaded(attributes: &AttributeSet, records: Vec<PostRecord>) -> FetchState {
        FetchState::Loaded {
            query: post_query(attributes).unwrap(),
            records,
        }
    }

    #[test]
    fn test_posts_mode_states_are_distinct() {
        let attributes = schema().defaults().with("dataSource", "posts");
        let query = post_query(&attributes).unwrap();
        let config = ThemeConfig::default();

        let loading = render(&attributes, &FetchState::Loading(query.clone()));
        let empty = render(&attributes, &loaded(&attributes, vec![]));
        let failed = render(
            &attributes,
            &FetchState::Failed {
                query,
                error: "timeout".into(),
            },
        );

        assert!(loading.contains(&config.render.loading_text));
        assert!(empty.contains(&config.render.no_items_text));
        assert!(failed.contains(&config.render.fetch_failed_text));
        assert!(!failed.contains("timeout"));
        assert!(loading.contains("role=\"status\""));
        assert!(failed.contains("role=\"alert\""));
        assert_eq!(render(&attributes, &FetchState::Idle), loading);
    }

    #[test]
    fn test_records_for_another_query_are_not_shown() {
        let attributes = schema().defaults().with("dataSource", "posts");
        let other = attributes.with("order", "DESC");
        let html = render(&attributes, &loaded(&other, vec![post(1, "Intake")]));
        assert!(!html.contains("<article"));
        assert!(html.contains(&ThemeConfig::default().render.loading_text));
    }

    #[test]
    fn test_posts_mode_shows_at_most_posts_to_show() {
        let attributes = schema()
            .defaults()
            .with("dataSource", "posts")
            .with("postsToShow", 2i64);
        let records = (1..=5).map(|id| post(id, &format!("Step {}", id))).collect();
        let html = render(&attributes, &loaded(&attributes, records));
        assert_eq!(html.matches("<article").count(), 2);
        assert!(!html.contains("Step 3"));
    }

    #[test]
    fn test_posts_mode_renders_records() {
        let attributes = schema().defaults().with("dataSource", "posts");
        let records = vec![post(3, "Intake"), post(1, ""), post(2, "Match")];
        let html = render(&attributes, &loaded(&attributes, records));

        assert!(html.contains("01. Intake"));
        assert!(html.contains("02. Match"));
        assert!(html.contains(">About Intake</p>"));
        assert!(!html.contains("Solliciteren"));
    }

    #[test]
    fn test_post_images_resolve_through_media_store() {
        let store = InMemoryMediaStore::new();
        store.insert(
            7,
            "large",
            ResolvedImage {
                url: "https://cdn/7-large.jpg".into(),
                width: 1024,
                height: 768,
            },
        );
        let mut record = post(1, "Intake");
        record.featured_media = Some(7);
        let attributes = schema().defaults().with("dataSource", "posts");
        let remote = loaded(&attributes, vec![record]);

        let config = ThemeConfig::default();
        let ctx = RenderContext::new(&store, &config, 2025).with_remote(&remote);
        let html = SectionProcessRenderer.render(&attributes, &ctx);

        assert!(html.contains(&format!("src=\"{}\"", escape_html("https://cdn/7-large.jpg"))));
        assert!(html.contains("alt=\"Intake\""));
        assert!(html.contains("width=\"1024\""));
    }

    #[test]
    fn test_step_text_is_escaped() {
        let steps = vec![AttributeValue::object([
            ("title", "<img src=x onerror=alert(1)>"),
            ("description", "Tom & Jerry"),
        ])];
        let html = render(&schema().defaults().with(STEPS, steps), &FetchState::Idle);
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("Tom &amp; Jerry"));
    }

    #[test]
    fn test_post_query() {
        let defaults = schema().defaults();
        assert!(post_query(&defaults).is_none());

        let attributes = defaults
            .with("dataSource", "posts")
            .with("postsToShow", 6i64)
            .with("orderBy", "title")
            .with("order", "DESC");
        let query = post_query(&attributes).unwrap();
        assert_eq!(query.per_page, 6);
        assert_eq!(query.order_by, OrderBy::Title);
        assert_eq!(query.order, Order::Desc);
    }

    #[test]
    fn test_v1_content_migrates() {
        let raw: RawAttributes = [(
            STEPS.to_string(),
            AttributeValue::Array(vec![AttributeValue::object([
                ("id", AttributeValue::from("step-a")),
                ("title", "Old".into()),
                ("imageId", AttributeValue::Integer(0)),
            ])]),
        )]
        .into_iter()
        .collect();

        let hydrated = definition().hydrate(&raw);
        assert!(hydrated.is_clean());
        assert_eq!(hydrated.attributes.str("dataSource"), "custom");
        let steps = hydrated.attributes.items(STEPS);
        assert!(steps[0].field("imageId").unwrap().is_null());
        assert_eq!(steps[0].field_str("stepNumber"), "01");
    }

    #[test]
    fn test_compact_v2_content_is_not_migrated() {
        // dataSource equals its default and is left out on save.
        let raw: RawAttributes = [(
            STEPS.to_string(),
            AttributeValue::Array(vec![AttributeValue::object([
                ("id", AttributeValue::from("step-a")),
                ("title", "New".into()),
                ("imageId", AttributeValue::Null),
            ])]),
        )]
        .into_iter()
        .collect();

        assert!(!saved_by_v1(&raw));
        assert!(definition().hydrate(&raw).is_clean());
    }

    #[test]
    fn test_new_step_template() {
        let item = new_step(5);
        assert_eq!(item.field_str("title"), "Step 05");
        assert!(item.field_str("id").is_empty());
    }
}
