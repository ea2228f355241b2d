//! Text extraction from downloaded pages
//!
//! Given the raw bytes of a page, this module produces the outbound links
//! found in the document and the number of occurrences of the search term in
//! the visible body text (script/style content and markup excluded).
//!
//! Link extraction can be switched off by the caller; occurrence counting
//! always runs.

use crate::TaskError;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Result of extracting one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Outbound links in discovery order, deduplicated
    pub links: Vec<Url>,

    /// Occurrences of the search term in the visible body text
    pub matches: usize,
}

/// Extracts links and term occurrences from a downloaded page
///
/// # Arguments
///
/// * `bytes` - Raw response body
/// * `base` - URL the page was fetched from, for resolving relative links
/// * `search_term` - Term to count, matched case-insensitively
/// * `scan_links` - When false, link extraction is skipped entirely and
///   `links` comes back empty
///
/// # Returns
///
/// * `Ok(Extraction)` - Links and match count
/// * `Err(TaskError::Decode)` - The payload is not valid UTF-8 text
pub fn extract(
    bytes: &[u8],
    base: &Url,
    search_term: &str,
    scan_links: bool,
) -> Result<Extraction, TaskError> {
    let html = std::str::from_utf8(bytes).map_err(|_| TaskError::Decode)?;

    let document = Html::parse_document(html);

    let links = if scan_links {
        extract_links(&document, base)
    } else {
        Vec::new()
    };

    let matches = count_occurrences(&visible_body_text(&document), search_term);

    Ok(Extraction { links, matches })
}

/// Extracts all followable links from the document, in discovery order
fn extract_links(document: &Html, base: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = std::collections::HashSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            // Links marked as downloads point at assets, not pages
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, base) {
                    if seen.insert(url.clone()) {
                        links.push(url);
                    }
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links (same page anchors)
/// - invalid URLs, or non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}

/// Collects the text a reader would see: body text with script and style
/// subtrees excluded
fn visible_body_text(document: &Html) -> String {
    let mut text = String::new();

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            collect_visible_text(body, &mut text);
        }
    }

    text
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() != "script" && el.name() != "style" => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_visible_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

/// Counts non-overlapping, case-insensitive occurrences of `term` in
/// `haystack`
fn count_occurrences(haystack: &str, term: &str) -> usize {
    if term.is_empty() {
        return 0;
    }

    let haystack = haystack.to_lowercase();
    let term = term.to_lowercase();

    let mut count = 0;
    let mut position = 0;
    while let Some(found) = haystack[position..].find(&term) {
        count += 1;
        position += found + term.len();
    }

    count
}
