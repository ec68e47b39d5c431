//! HTML parsing helpers
//!
//! Extracts anchors, titles, and the main content region of a page. All
//! functions take HTML text and return owned data so that no parsed document
//! is kept alive across an await point.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Returns every `href` attribute on an `<a>` tag, in document order
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.to_string())
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    // Same-page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}

/// Extracts the page title from the `<title>` tag
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Returns the outer HTML of the page's main content region
///
/// Candidates in priority order: `<main>`, `<article>`, a `<div>` carrying
/// one of `content_classes` (tried in the order given), then `<body>`.
pub fn extract_main_content(html: &str, content_classes: &[String]) -> Option<String> {
    let document = Html::parse_document(html);

    for tag in ["main", "article"] {
        if let Some(element) = first_match(&document, tag) {
            return Some(element.html());
        }
    }

    for class in content_classes {
        let Some(selector) = class_selector(class) else {
            continue;
        };
        if let Some(element) = first_match(&document, &selector) {
            return Some(element.html());
        }
    }

    first_match(&document, "body").map(|element| element.html())
}

fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

/// Builds `div.<class>` if the class name is a plain CSS identifier
fn class_selector(class: &str) -> Option<String> {
    let class = class.trim();
    let valid = !class.is_empty()
        && class
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| format!("div.{}", class))
}
