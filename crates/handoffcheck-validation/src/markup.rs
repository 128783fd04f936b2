//! Structural checks for rendered HTML and MJML source

use regex::Regex;
use std::sync::LazyLock;

static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*<!doctype\s+html").expect("doctype pattern is valid"));

static HTML_TAGS: LazyLock<[(&'static str, Regex); 3]> = LazyLock::new(|| {
    [
        ("<html>", Regex::new(r"(?i)<html[\s>]").expect("html pattern is valid")),
        ("<head>", Regex::new(r"(?i)<head[\s>]").expect("head pattern is valid")),
        ("<body>", Regex::new(r"(?i)<body[\s>]").expect("body pattern is valid")),
    ]
});

static MJML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(/)?\s*(mj[a-z0-9-]*)\b[^>]*?(/)?\s*>").expect("mjml tag pattern is valid")
});

/// Tags that may appear in MJML source
const MJML_TAGS: &[&str] = &[
    "mjml",
    "mj-head",
    "mj-body",
    "mj-attributes",
    "mj-all",
    "mj-class",
    "mj-breakpoint",
    "mj-font",
    "mj-html-attributes",
    "mj-selector",
    "mj-html-attribute",
    "mj-preview",
    "mj-style",
    "mj-title",
    "mj-include",
    "mj-section",
    "mj-column",
    "mj-group",
    "mj-wrapper",
    "mj-hero",
    "mj-text",
    "mj-image",
    "mj-button",
    "mj-divider",
    "mj-spacer",
    "mj-table",
    "mj-raw",
    "mj-social",
    "mj-social-element",
    "mj-navbar",
    "mj-navbar-link",
    "mj-accordion",
    "mj-accordion-element",
    "mj-accordion-title",
    "mj-accordion-text",
    "mj-carousel",
    "mj-carousel-image",
];

/// Missing structural pieces of an HTML document, empty when well-formed
#[must_use]
pub fn html_structure_problems(html: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if !DOCTYPE.is_match(html) {
        problems.push("HTML must begin with <!DOCTYPE html>".to_string());
    }
    for (name, pattern) in HTML_TAGS.iter() {
        if !pattern.is_match(html) {
            problems.push(format!("HTML is missing the {name} element"));
        }
    }
    problems
}

/// Check that MJML uses only known tags, is rooted at `<mjml>` and is balanced.
pub fn check_mjml(source: &str) -> Result<(), String> {
    let mut stack: Vec<&str> = Vec::new();
    let mut saw_root = false;

    for caps in MJML_TAG.captures_iter(source) {
        let closing = caps.get(1).is_some();
        let self_closing = caps.get(3).is_some();
        let Some(name) = caps.get(2).map(|m| m.as_str()) else {
            continue;
        };

        if !MJML_TAGS.contains(&name) {
            return Err(format!("Unknown MJML tag <{name}>"));
        }

        if !saw_root {
            if name != "mjml" || closing {
                return Err(format!("MJML must start with <mjml>, found <{name}>"));
            }
            saw_root = true;
        } else if stack.is_empty() && !closing {
            return Err(format!("<{name}> appears after the closing </mjml>"));
        }

        if closing {
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => {
                    return Err(format!("Mismatched MJML tags: <{open}> closed by </{name}>"));
                }
                None => return Err(format!("Unexpected closing tag </{name}>")),
            }
        } else if !self_closing {
            stack.push(name);
        }
    }

    if !saw_root {
        return Err("MJML source has no <mjml> root".to_string());
    }
    if let Some(open) = stack.last() {
        return Err(format!("Unclosed MJML tag <{open}>"));
    }
    Ok(())
}
