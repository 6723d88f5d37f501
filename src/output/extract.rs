//! Main-content extraction
//!
//! This module picks the element of a page most likely to hold its article
//! text, strips scripts, hidden elements and page chrome from it, and reads
//! the page's metadata from its head.

use crate::output::traits::{ContentExtractor, ExtractedPage, PageMetadata};
use chrono::{SecondsFormat, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Containers tried, in order, after `<article>`
const CONTENT_SELECTORS: &[&str] = &["main", "#content", ".content", "#main", ".main", ".post", ".article"];

/// Paragraphs shorter than this do not vote for a container
const MIN_PARAGRAPH_LENGTH: usize = 20;

/// Elements that never count as content containers
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];

/// Class or id words marking a container as page chrome
const NON_CONTENT_MARKERS: &[&str] = &[
    "nav", "navbar", "navigation", "menu", "sidebar", "banner", "ad", "ads", "advert", "footer",
    "comment", "comments", "related", "share", "social", "widget", "popup", "cookie", "cookies",
    "subscribe",
];

/// Elements removed from the selected content
const REMOVED_TAGS: &[&str] = &["script", "style", "iframe", "noscript"];

/// Class or id words marking an element for removal from the content
const REMOVED_MARKERS: &[&str] = &[
    "share", "social", "comment", "comments", "ad", "ads", "advert", "sidebar", "nav", "navbar",
    "navigation", "menu", "popup", "cookie", "cookies",
];

/// Extracts main content with document-structure heuristics
///
/// # Content Selection
///
/// 1. `<article>` with more than `min_content_length` characters of text
/// 2. The first of `main`, `#content`, `.content`, `#main`, `.main`,
///    `.post`, `.article` over the same threshold
/// 3. The container holding the most substantial paragraphs
/// 4. `<body>`
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    min_content_length: usize,
}

impl HeuristicExtractor {
    pub fn new(min_content_length: usize) -> Self {
        Self { min_content_length }
    }

    fn select_main_content<'a>(&self, document: &'a Html) -> ElementRef<'a> {
        if let Some(article) = select_all(document, "article").next() {
            if text_length(&article) > self.min_content_length {
                tracing::trace!("Using <article> as main content");
                return article;
            }
        }

        for selector in CONTENT_SELECTORS {
            if let Some(element) = select_all(document, selector).next() {
                if text_length(&element) > self.min_content_length {
                    tracing::trace!("Using {} as main content", selector);
                    return element;
                }
            }
        }

        if let Some(container) = densest_paragraph_container(document) {
            return container;
        }

        select_all(document, "body")
            .next()
            .unwrap_or_else(|| document.root_element())
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ContentExtractor for HeuristicExtractor {
    fn extract(&self, html: &str, url: &str) -> Option<ExtractedPage> {
        if html.trim().is_empty() {
            tracing::warn!("No HTML content provided for {}", url);
            return None;
        }

        let document = Html::parse_document(html);
        let metadata = extract_metadata(&document, url);

        let main = self.select_main_content(&document);
        let content_html = clean_content(&main.html());

        let content_length = text_length(&Html::parse_fragment(&content_html).root_element());
        if content_length == 0 {
            tracing::warn!("No text content left after cleaning {}", url);
            return None;
        }

        tracing::debug!("Extracted content from {} ({} chars)", url, content_length);
        Some(ExtractedPage {
            metadata,
            content_html,
        })
    }
}

/// Reads title, description, keywords, dates and author from a document
pub fn extract_metadata(document: &Html, url: &str) -> PageMetadata {
    PageMetadata {
        url: url.to_string(),
        title: extract_title(document),
        description: first_meta(
            document,
            &[r#"meta[property="og:description"]"#, r#"meta[name="description"]"#],
        ),
        keywords: first_meta(document, &[r#"meta[name="keywords"]"#])
            .map(|k| {
                k.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        date_extracted: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        date_published: extract_published_date(document),
        author: extract_author(document),
    }
}

fn extract_title(document: &Html) -> String {
    if let Some(title) = first_meta(document, &[r#"meta[property="og:title"]"#]) {
        return title;
    }

    for selector in ["title", "h1"] {
        if let Some(text) = select_all(document, selector).next().and_then(|e| element_text(&e)) {
            return text;
        }
    }

    "Untitled".to_string()
}

fn extract_published_date(document: &Html) -> Option<String> {
    first_meta(
        document,
        &[
            r#"meta[property="article:published_time"]"#,
            r#"meta[property="og:published_time"]"#,
            r#"meta[property="published_time"]"#,
            r#"meta[itemprop="datePublished"]"#,
        ],
    )
    .or_else(|| {
        select_all(document, "time[datetime]")
            .filter_map(|e| e.value().attr("datetime"))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn extract_author(document: &Html) -> Option<String> {
    if let Some(author) = first_meta(
        document,
        &[
            r#"meta[property="author"]"#,
            r#"meta[property="article:author"]"#,
            r#"meta[name="author"]"#,
            r#"meta[itemprop="author"]"#,
        ],
    ) {
        return Some(author);
    }

    // Bylines such as "By Jane Doe" keep only the name
    select_all(document, "a[class], span[class], div[class]")
        .filter(|e| {
            e.value()
                .attr("class")
                .map(|c| {
                    let c = c.to_lowercase();
                    c.contains("author") || c.contains("byline")
                })
                .unwrap_or(false)
        })
        .filter_map(|e| element_text(&e))
        .map(|text| strip_byline_prefix(&text).to_string())
        .find(|name| !name.is_empty())
}

/// Removes a leading "By " from a byline
fn strip_byline_prefix(text: &str) -> &str {
    let text = text.trim();
    match text.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => text[3..].trim_start(),
        _ => text,
    }
}

/// Returns the first non-empty `content` attribute among the selectors
fn first_meta(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        select_all(document, selector)
            .filter_map(|e| e.value().attr("content"))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Finds the container that encloses the most substantial paragraphs
fn densest_paragraph_container(document: &Html) -> Option<ElementRef<'_>> {
    let mut order = Vec::new();
    let mut votes = HashMap::new();

    for paragraph in select_all(document, "p") {
        if text_length(&paragraph) < MIN_PARAGRAPH_LENGTH {
            continue;
        }

        for ancestor in paragraph.ancestors().filter_map(ElementRef::wrap) {
            let name = ancestor.value().name();
            if name == "body" || name == "html" {
                break;
            }
            if !is_content_element(&ancestor) {
                continue;
            }
            let count = votes.entry(ancestor.id()).or_insert(0usize);
            if *count == 0 {
                order.push(ancestor);
            }
            *count += 1;
        }
    }

    // Ties go to the container seen first
    let mut best: Option<(ElementRef<'_>, usize)> = None;
    for candidate in order {
        let count = votes.get(&candidate.id()).copied().unwrap_or(0);
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((candidate, count));
        }
    }

    best.map(|(element, _)| element)
}

fn is_content_element(element: &ElementRef<'_>) -> bool {
    if NON_CONTENT_TAGS.contains(&element.value().name()) {
        return false;
    }
    !has_marker(element, NON_CONTENT_MARKERS)
}

/// Removes scripts, hidden elements and page chrome from an HTML fragment
pub fn clean_content(html: &str) -> String {
    let mut fragment = Html::parse_fragment(html);

    let doomed: Vec<_> = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(should_remove)
        .map(|e| e.id())
        .collect();

    for id in doomed {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    fragment.root_element().inner_html()
}

fn should_remove(element: &ElementRef<'_>) -> bool {
    if REMOVED_TAGS.contains(&element.value().name()) {
        return true;
    }

    if let Some(style) = element.value().attr("style") {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return true;
        }
    }

    has_marker(element, REMOVED_MARKERS)
}

/// Returns true if a word of the element's class or id is one of `markers`
///
/// Words are split on any non-alphanumeric character, so `social-share`
/// matches `share` while `header` does not match `ad`.
fn has_marker(element: &ElementRef<'_>, markers: &[&str]) -> bool {
    ["class", "id"].iter().any(|attr| {
        element
            .value()
            .attr(attr)
            .map(|value| {
                value
                    .to_lowercase()
                    .split(|c: char| !c.is_ascii_alphanumeric())
                    .any(|word| markers.contains(&word))
            })
            .unwrap_or(false)
    })
}

fn select_all<'a>(document: &'a Html, selector: &str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let parsed = Selector::parse(selector).ok();
    parsed
        .into_iter()
        .flat_map(move |s| document.select(&s).collect::<Vec<_>>())
}

/// Number of characters of text, ignoring surrounding whitespace of each run
fn text_length(element: &ElementRef<'_>) -> usize {
    element.text().map(|t| t.trim().chars().count()).sum()
}

fn element_text(element: &ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
