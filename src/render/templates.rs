//! Block templates
//!
//! Every block renders through one minijinja template compiled into a
//! shared environment on first use. Template names end in `.html`, which
//! turns HTML auto-escaping on: anything a template prints is escaped unless
//! it comes from a macro of `macros.html`.

use minijinja::{context, Environment};
use once_cell::sync::Lazy;
use serde::Serialize;

use super::markup;

const SOURCES: [(&str, &str); 8] = [
    ("macros.html", include_str!("templates/macros.html")),
    ("escape.html", "{{ value }}"),
    ("section_process.html", include_str!("templates/section_process.html")),
    ("section_text_image.html", include_str!("templates/section_text_image.html")),
    ("section_text_two_cta.html", include_str!("templates/section_text_two_cta.html")),
    (
        "section_title_text_horizontal.html",
        include_str!("templates/section_title_text_horizontal.html"),
    ),
    ("section_wide_image.html", include_str!("templates/section_wide_image.html")),
    ("site_footer.html", include_str!("templates/site_footer.html")),
];

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    markup::register_filters(&mut env);
    for (name, source) in SOURCES {
        if let Err(e) = env.add_template(name, source) {
            tracing::error!(template = name, error = %e, "Invalid block template");
        }
    }
    env
});

/// Render a block template
///
/// A failing template is logged and yields empty markup, so one broken block
/// does not take the rest of a document down with it.
pub fn render<S: Serialize>(name: &str, data: S) -> String {
    let result = TEMPLATES
        .get_template(name)
        .and_then(|template| template.render(data));
    match result {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(template = name, error = %e, "Block template failed");
            String::new()
        }
    }
}

/// Text as the templates print it
pub fn escape_html(text: &str) -> String {
    render("escape.html", context! { value => text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        for (name, _) in SOURCES {
            assert!(TEMPLATES.get_template(name).is_ok(), "{} does not compile", name);
        }
    }

    #[test]
    fn test_printed_values_are_escaped() {
        let escaped = escape_html(r#"<a href="x">Tom & Jerry</a>"#);
        assert!(escaped.starts_with("&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;"));
        assert!(!escaped.contains('<'));
    }

    #[test]
    fn test_unknown_template_renders_nothing() {
        assert_eq!(render("missing.html", context! {}), "");
    }
}
