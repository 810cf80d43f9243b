//! Section Text Two CTA block
//!
//! An "about us" card with up to three paragraphs next to two stacked
//! call-to-action cards. Each card links out through a round arrow button.

use minijinja::context;
use serde::Serialize;
use std::sync::Arc;

use super::{metadata, sections_category};
use crate::core::attribute::AttributeSet;
use crate::core::block::BlockDefinition;
use crate::core::schema::{AttributeSpec, BlockSchema};
use crate::render::markup::{class_list, safe_url};
use crate::render::{templates, RenderContext, StaticRenderer};

/// Block name
pub const NAME: &str = "julianboelen/section-text-two-cta";

const ABOUT_1: &str = "We koppelen IT-specialisten die op zoek zijn naar een nieuwe uitdaging of een volgende stap in hun carrière aan ambitieuze bedrijven. Dat doen we sinds 2008, en inmiddels hebben we stevig naam gemaakt binnen de Nederlandse IT-markt.";
const ABOUT_2: &str = "We werken vanuit een mooie plek in Den Haag met een bevlogen team van servicegerichte recruitment consultants die elk een eigen expertiseveld en regio hebben. Van daaruit begeleiden ze kandidaten in het traject richting een nieuwe uitdaging.";
const ABOUT_3: &str = "Inmiddels hebben we al meer dan 5000 specialisten succesvol kunnen verbinden aan uiteenlopende organisaties. En we zijn nog lang niet klaar.";
const CARD_1: &str = "Ben je freelance IT'er of op zoek naar een nieuwe interim opdracht? Bij StarApple vind je uitdagende projecten die bij je passen, bij toonaangevende opdrachtgevers in overheid, corporate en tech.";
const CARD_2: &str = "Op zoek naar tijdelijke IT-versterking of een expert voor jouw project? StarApple levert snel de juiste professional, met diepgaande marktkennis en een persoonlijke aanpak.";

/// Default look of one call-to-action card
struct CardDefaults {
    prefix: &'static str,
    title: &'static str,
    description: &'static str,
    gradient: (&'static str, &'static str),
    text_color: &'static str,
    button_color: &'static str,
}

const CARDS: [CardDefaults; 2] = [
    CardDefaults {
        prefix: "card1",
        title: "Voor IT-professionals",
        description: CARD_1,
        gradient: ("#a855f7", "#9333ea"),
        text_color: "#ffffff",
        button_color: "#9333ea",
    },
    CardDefaults {
        prefix: "card2",
        title: "Voor opdrachtgevers",
        description: CARD_2,
        gradient: ("#4ade80", "#22c55e"),
        text_color: "#111827",
        button_color: "#16a34a",
    },
];

fn card_attributes(card: &CardDefaults) -> Vec<AttributeSpec> {
    let key = |field: &str| format!("{}{}", card.prefix, field);
    vec![
        AttributeSpec::string(key("Title"), card.title),
        AttributeSpec::string(key("Description"), card.description),
        AttributeSpec::string(key("Url"), "#"),
        AttributeSpec::string(key("Target"), ""),
        AttributeSpec::string(key("Rel"), ""),
        AttributeSpec::string(key("GradientFrom"), card.gradient.0),
        AttributeSpec::string(key("GradientTo"), card.gradient.1),
        AttributeSpec::string(key("TextColor"), card.text_color),
        AttributeSpec::string(key("ButtonColor"), card.button_color),
    ]
}

/// Current schema
pub fn schema() -> BlockSchema {
    let mut attributes = vec![
        AttributeSpec::string("aboutTitle", "Over ons"),
        AttributeSpec::string("aboutParagraph1", ABOUT_1),
        AttributeSpec::string("aboutParagraph2", ABOUT_2),
        AttributeSpec::string("aboutParagraph3", ABOUT_3),
        AttributeSpec::string("aboutBackgroundColor", "#f9fafb"),
        AttributeSpec::string("aboutTextColor", "#374151"),
    ];
    for card in &CARDS {
        attributes.extend(card_attributes(card));
    }
    attributes.extend([
        AttributeSpec::string("containerMaxWidth", "7xl").one_of(&["5xl", "6xl", "7xl", "full"]),
        AttributeSpec::string("verticalPadding", "default").one_of(&["small", "default", "large", "xlarge"]),
        AttributeSpec::string("cardGap", "default").one_of(&["small", "default", "large"]),
        AttributeSpec::string("borderRadius", "3xl").one_of(&["lg", "xl", "2xl", "3xl"]),
    ]);
    BlockSchema::new(attributes).with_supports()
}

/// Block definition
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        metadata(
            "section-text-two-cta",
            "Section Text Two CTA",
            "About text next to two call-to-action cards",
            sections_category(),
            "columns",
            &["about", "cta", "cards"],
        ),
        schema(),
        Arc::new(StaticRenderer::new(render)),
    )
}

fn max_width_class(width: &str) -> &'static str {
    match width {
        "5xl" => "max-w-5xl",
        "6xl" => "max-w-6xl",
        "full" => "max-w-full",
        _ => "max-w-7xl",
    }
}

fn padding_class(padding: &str) -> &'static str {
    match padding {
        "small" => "py-6 sm:py-8",
        "large" => "py-12 sm:py-16",
        "xlarge" => "py-16 sm:py-20",
        _ => "py-8 sm:py-12",
    }
}

fn gap_class(gap: &str) -> &'static str {
    match gap {
        "small" => "gap-3 lg:gap-4",
        "large" => "gap-6 lg:gap-8",
        _ => "gap-4 lg:gap-6",
    }
}

fn radius_class(radius: &str) -> &'static str {
    match radius {
        "lg" => "rounded-lg",
        "xl" => "rounded-xl",
        "2xl" => "rounded-2xl",
        _ => "rounded-3xl",
    }
}

/// One call-to-action card as the template sees it
#[derive(Debug, Serialize)]
struct CtaCard<'a> {
    title: &'a str,
    description: &'a str,
    url: Option<String>,
    target: &'a str,
    rel: &'a str,
    gradient: String,
    text_color: &'a str,
    button_color: &'a str,
}

fn cta_card<'a>(attributes: &'a AttributeSet, prefix: &str) -> CtaCard<'a> {
    let field = |name: &str| attributes.str(&format!("{}{}", prefix, name));
    let (from, to) = (field("GradientFrom"), field("GradientTo"));
    let gradient = if from.is_empty() || to.is_empty() {
        String::new()
    } else {
        format!("linear-gradient(to bottom right, {}, {})", from, to)
    };
    CtaCard {
        title: field("Title"),
        description: field("Description"),
        url: safe_url(field("Url")),
        target: field("Target"),
        rel: field("Rel"),
        gradient,
        text_color: field("TextColor"),
        button_color: field("ButtonColor"),
    }
}

fn render(attributes: &AttributeSet, _ctx: &RenderContext<'_>) -> String {
    let wrapper = class_list(&[
        "section-text-two-cta-block w-full",
        max_width_class(attributes.str("containerMaxWidth")),
        "mx-auto px-4",
        padding_class(attributes.str("verticalPadding")),
    ]);
    let paragraphs: Vec<&str> = ["aboutParagraph1", "aboutParagraph2", "aboutParagraph3"]
        .into_iter()
        .map(|key| attributes.str(key))
        .filter(|paragraph| !paragraph.is_empty())
        .collect();
    let cards: Vec<CtaCard<'_>> = CARDS.iter().map(|card| cta_card(attributes, card.prefix)).collect();

    templates::render(
        "section_text_two_cta.html",
        context! {
            attrs => attributes,
            wrapper,
            gap => gap_class(attributes.str("cardGap")),
            radius => radius_class(attributes.str("borderRadius")),
            paragraphs,
            cards,
        },
    )
}
