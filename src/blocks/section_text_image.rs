//! Section Text Image block
//!
//! Two columns: a small heading, main heading, description and optional
//! call-to-action button on one side, a single image on the other.

use minijinja::context;
use serde::Serialize;
use std::sync::Arc;

use super::{metadata, sections_category};
use crate::core::attribute::AttributeSet;
use crate::core::block::BlockDefinition;
use crate::core::media::ImageReference;
use crate::core::schema::{AttributeSpec, BlockSchema};
use crate::render::markup::{class_list, contrast_color, safe_url};
use crate::render::{templates, RenderContext, StaticRenderer};

/// Block name
pub const NAME: &str = "julianboelen/section-text-image";

const DEFAULT_DESCRIPTION: &str = "StarApple is geen standaard bemiddelaar. Bij ons draait het om de perfecte interim match. Wij combineren inhoudelijke IT-expertise met een persoonlijke, gedreven aanpak. Of je nu zoekt naar de juiste interim opdracht of tijdelijke versterking, bij ons weet je precies wie je aan de lijn hebt en waar je aan toe bent. Leer ons kennen.";
const DEFAULT_IMAGE: &str = "https://images.unsplash.com/photo-1621155346337-1d19476ba7d6?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1200&h=800&fit=crop";

/// Current schema
pub fn schema() -> BlockSchema {
    BlockSchema::new(vec![
        AttributeSpec::string("smallHeading", "Dit is Starapple:"),
        AttributeSpec::string("mainHeading", "De specialist achter de match"),
        AttributeSpec::string("description", DEFAULT_DESCRIPTION),
        AttributeSpec::string("buttonText", "Over ons"),
        AttributeSpec::string("buttonUrl", "#"),
        AttributeSpec::string("buttonTarget", ""),
        AttributeSpec::string("buttonRel", ""),
        AttributeSpec::boolean("showButton", true),
        AttributeSpec::string("buttonBackgroundType", "primary").one_of(&["primary", "secondary", "custom"]),
        AttributeSpec::string("customButtonColor", "#9333ea"),
        AttributeSpec::string("imageUrl", DEFAULT_IMAGE),
        AttributeSpec::string("imageAlt", "Team collaboration"),
        AttributeSpec::integer("imageId", 0),
        AttributeSpec::string("imagePosition", "right").one_of(&["left", "right"]),
        AttributeSpec::string("backgroundColor", "#f9fafb"),
        AttributeSpec::string("textColor", "#1f2937"),
        AttributeSpec::string("smallHeadingColor", "#4b5563"),
        AttributeSpec::string("descriptionColor", "#374151"),
        AttributeSpec::string("contentAlignment", "left").one_of(&["left", "center"]),
        AttributeSpec::string("imageRoundness", "3xl").one_of(&["none", "lg", "xl", "2xl", "3xl", "full"]),
        AttributeSpec::string("columnGap", "12").one_of(&["8", "10", "12", "16"]),
        AttributeSpec::string("verticalPadding", "12").one_of(&["8", "12", "16", "20"]),
        AttributeSpec::boolean("showShadow", true),
    ])
    .with_supports()
}

/// Block definition
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        metadata(
            "section-text-image",
            "Section Text Image",
            "Heading, text and a call to action next to an image",
            sections_category(),
            "align-pull-right",
            &["text", "image", "cta", "about"],
        ),
        schema(),
        Arc::new(StaticRenderer::new(render)),
    )
}

/// Button background for a background type
pub fn button_background(kind: &str, custom: &str) -> String {
    match kind {
        "primary" => "var(--wp--preset--color--primary, #9333ea)".into(),
        "secondary" => "var(--wp--preset--color--secondary, #84eb93)".into(),
        "custom" => custom.into(),
        _ => "#9333ea".into(),
    }
}

/// Button text color for a background type
pub fn button_text_color(kind: &str, custom: &str) -> &'static str {
    match kind {
        "secondary" => "#1f2937",
        "custom" => contrast_color(custom),
        _ => "#ffffff",
    }
}

/// Call-to-action button, present only with text and a safe URL
#[derive(Debug, Serialize)]
struct Button {
    url: String,
    background: String,
    color: &'static str,
}

fn button(attributes: &AttributeSet) -> Option<Button> {
    if !attributes.bool("showButton") || attributes.str("buttonText").is_empty() {
        return None;
    }
    let kind = attributes.str("buttonBackgroundType");
    let custom = attributes.str("customButtonColor");
    Some(Button {
        url: safe_url(attributes.str("buttonUrl"))?,
        background: button_background(kind, custom),
        color: button_text_color(kind, custom),
    })
}

fn render(attributes: &AttributeSet, ctx: &RenderContext<'_>) -> String {
    let image_left = attributes.str("imagePosition") == "left";
    let image = ImageReference::from_fields(attributes.str("imageUrl"), attributes.get("imageId"))
        .and_then(|image| ctx.resolve_image_at(&image, "full"));
    let image_classes = class_list(&[
        "w-full h-auto object-cover",
        &roundness_class(attributes.str("imageRoundness")),
        if attributes.bool("showShadow") { "shadow-lg" } else { "" },
    ]);

    templates::render(
        "section_text_image.html",
        context! {
            attrs => attributes,
            text_order => if image_left { "order-2 lg:order-2" } else { "order-2 lg:order-1" },
            image_order => if image_left { "order-1 lg:order-1" } else { "order-1 lg:order-2" },
            image,
            image_classes,
            button => button(attributes),
        },
    )
}

fn roundness_class(roundness: &str) -> String {
    match roundness {
        "none" | "lg" | "xl" | "2xl" | "3xl" | "full" => format!("rounded-{}", roundness),
        _ => "rounded-3xl".into(),
    }
}
