//! Markup helpers
//!
//! Utility-class builders, URL sanitizing and tag stripping shared by the
//! block templates. Each helper is registered as a template filter; none of
//! them escapes, that is left to the template environment.

use minijinja::{Environment, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// URL schemes allowed in `href`/`src`
const SAFE_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

/// An opening, closing, comment or declaration tag; a lone `<` is text
static TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[A-Za-z/!?][^>]*>").ok());

/// Register every helper as a filter
pub fn register_filters(env: &mut Environment<'_>) {
    env.add_filter("classes", |values: Vec<Value>| {
        let names: Vec<String> = values.iter().map(display).collect();
        class_list(&names.iter().map(String::as_str).collect::<Vec<_>>())
    });
    env.add_filter("css", css_filter);
    env.add_filter("url", |url: String| safe_url(&url).unwrap_or_default());
    env.add_filter("strip_tags", |html: String| strip_tags(&html));
    env.add_filter("grid_columns", grid_columns_class);
    env.add_filter("gap", |gap: String| gap_class(&gap));
    env.add_filter("padding", |top: String, bottom: String| padding_class(&top, &bottom));
    env.add_filter("margin_bottom", |margin: String| margin_bottom_class(&margin));
    env.add_filter("rounded", |radius: String| border_radius_class(&radius));
    env.add_filter("shadow", |shadow: String| shadow_class(&shadow));
    env.add_filter("hover_shadow", |shadow: String, enabled: bool| {
        hover_shadow_class(enabled, &shadow)
    });
}

/// Template value as text; `none` and undefined are empty
fn display(value: &Value) -> String {
    if value.is_none() || value.is_undefined() {
        String::new()
    } else {
        value.to_string()
    }
}

/// `[[prop, value], ...]` to a declaration list
fn css_filter(declarations: Vec<Value>) -> String {
    let pairs: Vec<(String, String)> = declarations
        .iter()
        .filter_map(|pair| {
            let prop = pair.get_item_by_index(0).ok()?;
            let value = pair.get_item_by_index(1).ok()?;
            Some((display(&prop), display(&value)))
        })
        .collect();
    css_declarations(
        &pairs
            .iter()
            .map(|(prop, value)| (prop.as_str(), value.as_str()))
            .collect::<Vec<_>>(),
    )
}

/// `a: b; c: d` for every declaration with a non-empty value
pub fn css_declarations(declarations: &[(&str, &str)]) -> String {
    declarations
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(prop, value)| format!("{}: {}", prop, value.trim()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Sanitize a URL for an `href`/`src` attribute
///
/// Absolute URLs must use one of the safe schemes; relative URLs and
/// fragments pass. Anything else (`javascript:`, `data:`, unparseable
/// hosts) is rejected.
pub fn safe_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    let allowed = match Url::parse(url) {
        Ok(parsed) => SAFE_SCHEMES.contains(&parsed.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(e) => {
            tracing::debug!(url, error = %e, "Rejecting unparseable URL");
            false
        }
    };
    allowed.then(|| url.replace(' ', "%20"))
}

/// Strip markup tags from a string (excerpts, labels)
pub fn strip_tags(html: &str) -> String {
    match TAG.as_ref() {
        Some(tag) => tag.replace_all(html, "").trim().to_string(),
        None => html.trim().to_string(),
    }
}

/// Join non-empty class names with single spaces
pub fn class_list(classes: &[&str]) -> String {
    classes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Responsive grid column classes
pub fn grid_columns_class(mobile: i64, tablet: i64, desktop: i64) -> String {
    format!(
        "grid-cols-{} sm:grid-cols-{} lg:grid-cols-{}",
        mobile.unsigned_abs(),
        tablet.unsigned_abs(),
        desktop.unsigned_abs()
    )
}

/// `gap-N`
pub fn gap_class(gap: &str) -> String {
    format!("gap-{}", gap)
}

/// Vertical padding classes
pub fn padding_class(top: &str, bottom: &str) -> String {
    format!("py-{} pb-{}", top, bottom)
}

/// `mb-N`
pub fn margin_bottom_class(margin: &str) -> String {
    format!("mb-{}", margin)
}

/// `rounded-X`, nothing for `none`
pub fn border_radius_class(radius: &str) -> String {
    match radius {
        "none" | "" => String::new(),
        other => format!("rounded-{}", other),
    }
}

/// `shadow-X`, nothing for `none`
pub fn shadow_class(shadow: &str) -> String {
    match shadow {
        "none" | "" => String::new(),
        other => format!("shadow-{}", other),
    }
}

/// `hover:shadow-X` when hover effects are enabled
pub fn hover_shadow_class(enabled: bool, shadow: &str) -> String {
    if !enabled || shadow == "none" || shadow.is_empty() {
        return String::new();
    }
    format!("hover:shadow-{}", shadow)
}

/// Readable text color on a `#rgb` / `#rrggbb` background
///
/// Dark text on light backgrounds, white otherwise. Unparseable colors count
/// as dark.
pub fn contrast_color(background: &str) -> &'static str {
    let hex = background.trim().trim_start_matches('#');
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        _ => hex.chars().take(6).collect(),
    };
    let channel = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map_or(0, u32::from)
    };
    let brightness = (channel(0) * 299 + channel(2) * 587 + channel(4) * 114) / 1000;
    if brightness > 128 {
        "#1f2937"
    } else {
        "#ffffff"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_url() {
        assert_eq!(safe_url("https://example.com/a b").unwrap(), "https://example.com/a%20b");
        assert_eq!(safe_url("/over-ons").unwrap(), "/over-ons");
        assert_eq!(safe_url("#contact").unwrap(), "#contact");
        assert_eq!(safe_url("tel:+31701234567").unwrap(), "tel:+31701234567");
        assert_eq!(safe_url("https://x/?a=1&b=2").unwrap(), "https://x/?a=1&b=2");
        assert!(safe_url("javascript:alert(1)").is_none());
        assert!(safe_url(" JavaScript:alert(1)").is_none());
        assert!(safe_url("data:text/html;base64,PHA+").is_none());
        assert!(safe_url("").is_none());
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Stuur je <b>CV</b></p>\n"), "Stuur je CV");
        assert_eq!(strip_tags("<!-- note -->Intake"), "Intake");
    }

    #[test]
    fn test_strip_tags_keeps_text_after_stray_angle() {
        assert_eq!(strip_tags("1 < 2 and <em>3 > 2</em>"), "1 < 2 and 3 > 2");
        assert_eq!(strip_tags("Score <5 wins"), "Score <5 wins");
    }

    #[test]
    fn test_class_builders() {
        assert_eq!(grid_columns_class(1, 2, 4), "grid-cols-1 sm:grid-cols-2 lg:grid-cols-4");
        assert_eq!(border_radius_class("none"), "");
        assert_eq!(border_radius_class("lg"), "rounded-lg");
        assert_eq!(shadow_class("md"), "shadow-md");
        assert_eq!(hover_shadow_class(false, "lg"), "");
        assert_eq!(hover_shadow_class(true, "lg"), "hover:shadow-lg");
        assert_eq!(class_list(&["a", "", " b ", "c"]), "a b c");
    }

    #[test]
    fn test_contrast_color() {
        assert_eq!(contrast_color("#ffffff"), "#1f2937");
        assert_eq!(contrast_color("#fff"), "#1f2937");
        assert_eq!(contrast_color("#9333ea"), "#ffffff");
        assert_eq!(contrast_color("not a color"), "#ffffff");
    }

    #[test]
    fn test_css_declarations() {
        assert_eq!(css_declarations(&[("color", "")]), "");
        assert_eq!(
            css_declarations(&[("background-color", "#fff"), ("color", "#111")]),
            "background-color: #fff; color: #111"
        );
    }
}
