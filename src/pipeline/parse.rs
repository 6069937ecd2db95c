//! Parse stage: extract title and clean text from raw HTML
//!
//! Locates a main-content region by trying semantic containers before common
//! content-class conventions, falling back to the whole body. Script, style
//! and chrome elements (nav/header/footer) contribute no text.

use scraper::{ElementRef, Html, Selector};

/// Elements whose text is never article content
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "nav", "header", "footer", "aside"];

/// Content-region selectors, most specific first
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    ".post-content",
    ".article-content",
];

/// Output of the parse stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArticle {
    pub title: String,
    pub text: String,
    pub word_count: i64,
}

/// Parse HTML into title + normalized text; `None` when there is no
/// readable content at all.
pub fn parse_html(html: &str) -> Option<ParsedArticle> {
    let document = Html::parse_document(html);

    let region = find_content_region(&document)?;

    let mut raw = String::new();
    collect_text(&region, &mut raw);
    let text = normalize_whitespace(&raw);
    if text.is_empty() {
        return None;
    }

    let title = extract_title(&document).unwrap_or_else(|| "Untitled".to_string());
    let word_count = text.split_whitespace().count() as i64;

    Some(ParsedArticle {
        title,
        text,
        word_count,
    })
}

fn find_content_region(document: &Html) -> Option<ElementRef<'_>> {
    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                return Some(element);
            }
        }
    }
    // Fall back to the full body
    let body = Selector::parse("body").ok()?;
    document.select(&body).next()
}

/// Title from `<title>`, falling back to the first `<h1>`.
fn extract_title(document: &Html) -> Option<String> {
    for selector_str in ["title", "h1"] {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = element.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Recursive text extraction, skipping non-content elements and breaking
/// lines after block-level elements so paragraph structure survives.
fn collect_text(element: &ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = child.value().as_element() {
            if SKIP_TAGS.contains(&child_element.name()) {
                continue;
            }
            if let Some(child_ref) = ElementRef::wrap(child) {
                collect_text(&child_ref, out);
                if matches!(
                    child_element.name(),
                    "p" | "div" | "br" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li"
                ) {
                    out.push('\n');
                }
            }
        } else if let Some(text_node) = child.value().as_text() {
            out.push_str(text_node);
        }
    }
}

/// Collapse runs of spaces to one space and runs of blank lines to at most
/// one blank line.
fn normalize_whitespace(input: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_blank_run = false;

    for line in input.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !in_blank_run && !lines.is_empty() {
                lines.push(String::new());
            }
            in_blank_run = true;
        } else {
            in_blank_run = false;
            lines.push(collapsed);
        }
    }

    while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
        lines.pop();
    }

    lines.join("\n")
}
