//! HTML parser for extracting links
//!
//! This module parses fetched pages and returns the normalized URLs of the
//! anchors they contain. Site and file-type filtering is left to the caller.

use crate::url::normalize_url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts every followable anchor from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Empty hrefs and fragment-only links (same page anchors)
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - References that do not resolve against the page URL
///
/// Each surviving href is normalized against `page_url`. The result keeps
/// document order and contains each URL once. Malformed HTML yields whatever
/// anchors the parser recovers, possibly none.
///
/// # Example
///
/// ```
/// use webmark::crawler::extract_links;
/// use url::Url;
///
/// let html = r##"<a href="/docs#intro">Docs</a><a href="mailto:a@b.c">Mail</a>"##;
/// let page = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &page);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/docs");
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if is_skipped_href(href) {
            continue;
        }

        match normalize_url(page_url, href) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
            Err(e) => tracing::trace!("Ignoring unresolvable link {:?} on {}: {}", href, page_url, e),
        }
    }

    links
}

/// Returns true for hrefs that never name a page
fn is_skipped_href(href: &str) -> bool {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return true;
    }

    let lower = href.to_ascii_lowercase();
    ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
