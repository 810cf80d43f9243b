//! Site Footer block
//!
//! Copyright line and social links. The company name and links come from the
//! theme options unless the block overrides the name. The year is taken from
//! the render context, never from the clock.

use minijinja::context;
use serde::Serialize;
use std::sync::Arc;

use super::metadata;
use crate::core::attribute::AttributeSet;
use crate::core::block::{BlockCategory, BlockDefinition};
use crate::core::schema::{AttributeSpec, BlockSchema};
use crate::render::markup::safe_url;
use crate::render::{templates, RenderContext, StaticRenderer};

/// Block name
pub const NAME: &str = "julianboelen/site-footer";

/// Current schema
pub fn schema() -> BlockSchema {
    BlockSchema::new(vec![
        AttributeSpec::string("companyName", ""),
        AttributeSpec::string("rightsText", "All rights reserved."),
        AttributeSpec::boolean("showSocialLinks", true),
    ])
    .with_supports()
}

/// Block definition
pub fn definition() -> BlockDefinition {
    BlockDefinition::new(
        metadata(
            "site-footer",
            "Site Footer",
            "Copyright notice and social links",
            BlockCategory::Theme,
            "editor-insertmore",
            &["footer", "copyright", "social"],
        ),
        schema(),
        Arc::new(StaticRenderer::new(render)),
    )
}

/// A social link that survived URL sanitizing
#[derive(Debug, Serialize)]
struct FooterLink<'a> {
    network: &'a str,
    url: String,
    icon: Option<String>,
}

fn render(attributes: &AttributeSet, ctx: &RenderContext<'_>) -> String {
    let theme = &ctx.config.theme;
    let company = match attributes.str("companyName") {
        "" => theme.company_name.as_str(),
        name => name,
    };

    let links: Vec<FooterLink<'_>> = theme
        .social_links
        .iter()
        .filter(|_| attributes.bool("showSocialLinks"))
        .filter(|link| !link.network.is_empty())
        .filter_map(|link| {
            Some(FooterLink {
                network: &link.network,
                url: safe_url(&link.url)?,
                icon: link.icon.as_deref().and_then(safe_url),
            })
        })
        .collect();

    templates::render(
        "site_footer.html",
        context! {
            attrs => attributes,
            company,
            year => ctx.copyright_year,
            footer_text => &theme.footer_text,
            links,
        },
    )
}
