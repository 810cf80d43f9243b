//! Section Title Text Horizontal block
//!
//! Heading on the left, one or two paragraphs on the right, on a 12-column
//! grid split by `columnRatio`.

use minijinja::context;
use std::sync::Arc;

use super::{metadata, sections_category};
use crate::core::attribute::AttributeSet;
use crate::core::block::BlockDefinition;
use crate::core::schema::{AttributeSpec, BlockSchema};
use crate::render::{templates, RenderContext, StaticRenderer};

/// Block name
pub const NAME: &str = "julianboelen/section-title-text-horizontal";

/// Current schema
pub fn schema() -> BlockSchema {
    BlockSchema::new(vec![
        AttributeSpec::string("heading", "Wij zijn Starapple en wij willen talent laten groeien!"),
        AttributeSpec::string(
            "paragraph1",
            "Een brug slaan tussen aanbod van en vraag naar uiterst specifieke IT-specialisten, dat is Starapple in één zin.",
        ),
        AttributeSpec::string(
            "paragraph2",
            "Wij helpen je graag in jou zoektocht naar een nieuwe uitdaging zodat jij jouw carrière verder kunt ontwikkelen.",
        ),
        AttributeSpec::string("backgroundColor", "#ffffff"),
        AttributeSpec::string("headingColor", "#111827"),
        AttributeSpec::string("textColor", "#111827"),
        AttributeSpec::string("headingSize", "large").one_of(&["medium", "large", "xlarge"]),
        AttributeSpec::string("textSize", "base").one_of(&["small", "base", "large"]),
        AttributeSpec::string("columnRatio", "5-7").one_of(&["4-8", "5-7", "6-6"]),
        AttributeSpec::string("verticalAlignment", "start").one_of(&["start", "center", "end"]),
        AttributeSpec::string("columnGap", "large").one_of(&["small", "medium", "large", "xlarge"]),
        AttributeSpec::string("paddingTop", "16"),
        AttributeSpec::string("paddingBottom", "16"),
        AttributeSpec::string("maxWidth", "7xl").one_of(&["5xl", "6xl", "7xl", "full"]),
        AttributeSpec::boolean("showParagraph2", true),
        AttributeSpec::string("paragraphSpacing", "6"),
    ])
    .with_supports()
}

/// Block definition
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        metadata(
            "section-title-text-horizontal",
            "Section Title Text Horizontal",
            "A heading beside one or two paragraphs",
            sections_category(),
            "editor-table",
            &["heading", "text", "intro"],
        ),
        schema(),
        Arc::new(StaticRenderer::new(render)),
    )
}

/// `lg:col-span-*` classes of the heading and text columns
pub fn column_spans(ratio: &str) -> (&'static str, &'static str) {
    match ratio {
        "4-8" => ("lg:col-span-4", "lg:col-span-8"),
        "6-6" => ("lg:col-span-6", "lg:col-span-6"),
        _ => ("lg:col-span-5", "lg:col-span-7"),
    }
}

fn heading_size_class(size: &str) -> &'static str {
    match size {
        "medium" => "text-3xl sm:text-4xl lg:text-5xl",
        "xlarge" => "text-5xl sm:text-6xl lg:text-7xl",
        _ => "text-4xl sm:text-5xl lg:text-6xl",
    }
}

fn text_size_class(size: &str) -> &'static str {
    match size {
        "small" => "text-sm sm:text-base",
        "large" => "text-lg sm:text-xl",
        _ => "text-base sm:text-lg",
    }
}

fn gap_class(gap: &str) -> &'static str {
    match gap {
        "small" => "gap-4 lg:gap-6",
        "medium" => "gap-6 lg:gap-8",
        "xlarge" => "gap-10 lg:gap-16",
        _ => "gap-8 lg:gap-12",
    }
}

fn max_width_class(width: &str) -> &'static str {
    match width {
        "5xl" => "max-w-5xl",
        "6xl" => "max-w-6xl",
        "full" => "max-w-full",
        _ => "max-w-7xl",
    }
}

/// Pixel value of a spacing-scale step; non-numeric steps count as 0
fn spacing_px(step: &str) -> u32 {
    step.trim().parse::<u32>().map_or(0, |n| n * 4)
}

fn px(value: &str) -> String {
    match value.trim().parse::<u32>() {
        Ok(n) => format!("{}px", n),
        Err(_) => String::new(),
    }
}

fn render(attributes: &AttributeSet, _ctx: &RenderContext<'_>) -> String {
    let (left_span, right_span) = column_spans(attributes.str("columnRatio"));
    let alignment = match attributes.str("verticalAlignment") {
        "center" => "items-center",
        "end" => "items-end",
        _ => "items-start",
    };
    let mut paragraphs = vec![attributes.str("paragraph1")];
    if attributes.bool("showParagraph2") {
        paragraphs.push(attributes.str("paragraph2"));
    }
    paragraphs.retain(|paragraph| !paragraph.is_empty());

    templates::render(
        "section_title_text_horizontal.html",
        context! {
            attrs => attributes,
            left_span,
            right_span,
            alignment,
            max_width => max_width_class(attributes.str("maxWidth")),
            gap => gap_class(attributes.str("columnGap")),
            heading_size => heading_size_class(attributes.str("headingSize")),
            text_size => text_size_class(attributes.str("textSize")),
            padding_top => px(attributes.str("paddingTop")),
            padding_bottom => px(attributes.str("paddingBottom")),
            paragraph_gap => spacing_px(attributes.str("paragraphSpacing")),
            paragraphs,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;
    use crate::core::media::NoMedia;

    fn render_with(attributes: &AttributeSet) -> String {
        let config = ThemeConfig::default();
        let ctx = RenderContext::new(&NoMedia, &config, 2025);
        definition().renderer().render(attributes, &ctx)
    }

    #[test]
    fn test_defaults() {
        let html = render_with(&schema().defaults());
        assert!(html.contains("padding-top: 16px; padding-bottom: 16px"));
        assert!(html.contains("lg:col-span-5"));
        assert!(html.contains("gap: 24px;"));
        assert_eq!(html.matches("<p ").count(), 2);
    }

    #[test]
    fn test_hidden_second_paragraph_and_ratio() {
        let attributes = schema()
            .defaults()
            .with("showParagraph2", false)
            .with("columnRatio", "4-8")
            .with("verticalAlignment", "center");
        let html = render_with(&attributes);
        assert_eq!(html.matches("<p ").count(), 1);
        assert!(html.contains("lg:col-span-8"));
        assert!(html.contains("items-center"));
    }

    #[test]
    fn test_region_label_is_plain_heading() {
        let html = render_with(&schema().defaults().with("heading", "Wij <strong>groeien</strong>"));
        assert!(html.contains("aria-label=\"Wij groeien\""));
        assert!(html.contains("Wij &lt;strong&gt;groeien"));
    }

    #[test]
    fn test_non_numeric_spacing() {
        assert_eq!(spacing_px("abc"), 0);
        assert_eq!(px("12; color: red"), "");
        let html = render_with(&schema().defaults().with("paddingTop", "x"));
        assert!(!html.contains("padding-top"));
    }
}
