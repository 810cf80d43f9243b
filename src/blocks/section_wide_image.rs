//! Section Wide Image block
//!
//! A full-width image with optional link, color overlay and scroll
//! animation (`data-aos-*` attributes).

use minijinja::context;
use std::sync::Arc;

use super::{metadata, sections_category};
use crate::core::attribute::AttributeSet;
use crate::core::block::BlockDefinition;
use crate::core::media::ImageReference;
use crate::core::schema::{AttributeSpec, BlockSchema};
use crate::render::markup::safe_url;
use crate::render::{templates, RenderContext, StaticRenderer};

/// Block name
pub const NAME: &str = "julianboelen/section-wide-image";

const DEFAULT_IMAGE: &str = "https://images.unsplash.com/photo-1575936123452-b67c3203c357?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1920";

/// Current schema
pub fn schema() -> BlockSchema {
    BlockSchema::new(vec![
        AttributeSpec::string("imageUrl", DEFAULT_IMAGE),
        AttributeSpec::integer("imageId", 0),
        AttributeSpec::string(
            "imageAlt",
            "Collaborative workspace with laptops, tablets, notebooks and coffee on wooden table",
        ),
        AttributeSpec::integer("imageWidth", 1920).range(1.0, 10000.0),
        AttributeSpec::integer("imageHeight", 800).range(1.0, 10000.0),
        AttributeSpec::string("objectFit", "cover").one_of(&["cover", "contain", "fill", "none", "scale-down"]),
        AttributeSpec::string("borderRadius", "2xl")
            .one_of(&["none", "sm", "md", "lg", "xl", "2xl", "3xl", "full"]),
        AttributeSpec::boolean("enableAnimation", true),
        AttributeSpec::string("animationType", "fade-up").one_of(&[
            "fade",
            "fade-up",
            "fade-down",
            "fade-left",
            "fade-right",
            "zoom-in",
            "zoom-out",
            "flip-up",
        ]),
        AttributeSpec::integer("animationDuration", 1200).range(0.0, 5000.0),
        AttributeSpec::integer("animationDelay", 0).range(0.0, 5000.0),
        AttributeSpec::string("animationEasing", "ease-in-out")
            .one_of(&["linear", "ease", "ease-in", "ease-out", "ease-in-out"]),
        AttributeSpec::string("aspectRatio", "auto").one_of(&["auto", "16/9", "4/3", "3/2", "21/9", "1/1"]),
        AttributeSpec::string("maxHeight", "none"),
        AttributeSpec::boolean("overlayEnabled", false),
        AttributeSpec::string("overlayColor", "rgba(0, 0, 0, 0.3)"),
        AttributeSpec::integer("overlayOpacity", 30).range(0.0, 100.0),
        AttributeSpec::string("linkUrl", ""),
        AttributeSpec::string("linkTarget", ""),
        AttributeSpec::string("linkRel", ""),
        AttributeSpec::boolean("enableLazyLoad", true),
        AttributeSpec::string("containerPadding", "none").one_of(&["none", "sm", "md", "lg", "xl"]),
    ])
    .with_supports()
}

/// Block definition
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        metadata(
            "section-wide-image",
            "Section Wide Image",
            "A full-width image with optional link and overlay",
            sections_category(),
            "format-image",
            &["image", "banner", "hero"],
        ),
        schema(),
        Arc::new(StaticRenderer::new(render)),
    )
}

fn radius_class(radius: &str) -> &'static str {
    match radius {
        "none" => "rounded-none",
        "sm" => "rounded-sm",
        "md" => "rounded-md",
        "lg" => "rounded-lg",
        "xl" => "rounded-xl",
        "3xl" => "rounded-3xl",
        "full" => "rounded-full",
        _ => "rounded-2xl",
    }
}

fn object_fit_class(fit: &str) -> &'static str {
    match fit {
        "contain" => "object-contain",
        "fill" => "object-fill",
        "none" => "object-none",
        "scale-down" => "object-scale-down",
        _ => "object-cover",
    }
}

/// Aspect-ratio utility class; empty for `auto`
pub fn aspect_ratio_class(ratio: &str) -> &'static str {
    match ratio {
        "16/9" => "aspect-video",
        "4/3" => "aspect-[4/3]",
        "3/2" => "aspect-[3/2]",
        "21/9" => "aspect-[21/9]",
        "1/1" => "aspect-square",
        _ => "",
    }
}

fn container_padding_class(padding: &str) -> &'static str {
    match padding {
        "sm" => "px-4",
        "md" => "px-6 md:px-8",
        "lg" => "px-8 md:px-12",
        "xl" => "px-12 md:px-16 lg:px-20",
        _ => "",
    }
}

fn render(attributes: &AttributeSet, ctx: &RenderContext<'_>) -> String {
    let image = ImageReference::from_fields(attributes.str("imageUrl"), attributes.get("imageId"))
        .and_then(|image| ctx.resolve_image_at(&image, "full"));
    let max_height = match attributes.str("maxHeight") {
        "none" => "",
        other => other,
    };

    templates::render(
        "section_wide_image.html",
        context! {
            attrs => attributes,
            container_padding => container_padding_class(attributes.str("containerPadding")),
            aspect => aspect_ratio_class(attributes.str("aspectRatio")),
            radius => radius_class(attributes.str("borderRadius")),
            object_fit => object_fit_class(attributes.str("objectFit")),
            max_height,
            image,
            link => safe_url(attributes.str("linkUrl")),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;
    use crate::core::media::{InMemoryMediaStore, MediaStore, NoMedia, ResolvedImage};
    use crate::render::templates::escape_html;

    fn render_in(media: &dyn MediaStore, attributes: &AttributeSet) -> String {
        let config = ThemeConfig::default();
        let ctx = RenderContext::new(media, &config, 2025);
        definition().renderer().render(attributes, &ctx)
    }

    #[test]
    fn test_defaults() {
        let html = render_in(&NoMedia, &schema().defaults());
        assert!(html.contains("data-aos=\"fade-up\" data-aos-duration=\"1200\" data-aos-easing=\"ease-in-out\""));
        assert!(!html.contains("data-aos-delay"));
        assert!(html.contains("loading=\"lazy\""));
        assert!(html.contains("width=\"1920\" height=\"800\""));
        assert!(!html.contains("max-height"));
        assert!(!html.contains("aria-hidden"));
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_link_overlay_and_eager_loading() {
        let attributes = schema()
            .defaults()
            .with("linkUrl", "/vacatures")
            .with("linkTarget", "_blank")
            .with("overlayEnabled", true)
            .with("enableLazyLoad", false)
            .with("animationDelay", 200i64)
            .with("maxHeight", "600px")
            .with("aspectRatio", "16/9");
        let html = render_in(&NoMedia, &attributes);
        let link = format!("<a href=\"{}\" class=\"block\" target=\"_blank\"", escape_html("/vacatures"));
        assert!(html.contains(&link));
        assert!(html.contains("background-color: rgba(0, 0, 0, 0.3)"));
        assert!(html.contains("fetchpriority=\"high\""));
        assert!(html.contains("data-aos-delay=\"200\""));
        assert!(html.contains("max-height: 600px"));
        assert!(html.contains("aspect-video"));
    }

    #[test]
    fn test_unsafe_link_renders_bare_image() {
        let attributes = schema().defaults().with("linkUrl", "javascript:alert(1)");
        let html = render_in(&NoMedia, &attributes);
        assert!(!html.contains("<a "));
        assert!(html.contains("<img"));
    }

    #[test]
    fn test_media_image_uses_full_size() {
        let media = InMemoryMediaStore::new();
        media.insert(
            5,
            "full",
            ResolvedImage {
                url: "https://cdn.example/wide.jpg".into(),
                width: 2400,
                height: 1000,
            },
        );
        let attributes = schema().defaults().with("imageId", 5i64).with("enableAnimation", false);
        let html = render_in(&media, &attributes);
        assert!(html.contains(&format!("src=\"{}\"", escape_html("https://cdn.example/wide.jpg"))));
        assert!(!html.contains("data-aos"));

        // Deleted media omits the image but keeps the wrapper.
        let html = render_in(&NoMedia, &attributes);
        assert!(!html.contains("<img"));
        assert!(html.contains("section-wide-image-block"));
    }
}
