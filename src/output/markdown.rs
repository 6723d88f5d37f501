//! Markdown document generation
//!
//! This module turns extracted page content into a markdown document with a
//! YAML frontmatter header describing where the page came from.

use crate::output::traits::{ExtractedPage, MarkdownConverter, OutputError, OutputResult, PageMetadata};
use htmd::HtmlToMarkdown;

/// Converts extracted HTML to markdown with htmd
#[derive(Debug, Clone)]
pub struct HtmdConverter {
    skip_tags: Vec<&'static str>,
}

impl HtmdConverter {
    pub fn new() -> Self {
        Self {
            skip_tags: vec!["script", "style", "noscript", "iframe"],
        }
    }
}

impl Default for HtmdConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter for HtmdConverter {
    fn convert(&self, page: &ExtractedPage) -> OutputResult<String> {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(self.skip_tags.clone())
            .build();

        let body = converter
            .convert(&page.content_html)
            .map_err(|e| OutputError::Conversion(e.to_string()))?;

        let mut document = format_frontmatter(&page.metadata);

        if let Some(description) = &page.metadata.description {
            for line in description.lines() {
                document.push_str("> ");
                document.push_str(line.trim());
                document.push('\n');
            }
            document.push('\n');
        }

        document.push_str(&clean_markdown(&body));
        Ok(document)
    }
}

/// Renders the YAML frontmatter block, followed by a blank line
///
/// String values are written as JSON strings, which YAML accepts as
/// double-quoted scalars.
pub fn format_frontmatter(metadata: &PageMetadata) -> String {
    let mut fm = String::from("---\n");

    push_field(&mut fm, "title", &metadata.title);
    push_field(&mut fm, "source_url", &metadata.url);
    push_field(&mut fm, "date_extracted", &metadata.date_extracted);
    if let Some(published) = &metadata.date_published {
        push_field(&mut fm, "date_published", published);
    }
    if let Some(author) = &metadata.author {
        push_field(&mut fm, "author", author);
    }
    if !metadata.keywords.is_empty() {
        fm.push_str("keywords:\n");
        for keyword in &metadata.keywords {
            fm.push_str(&format!("  - {}\n", quote(keyword)));
        }
    }

    fm.push_str("---\n\n");
    fm
}

fn push_field(fm: &mut String, key: &str, value: &str) {
    fm.push_str(&format!("{}: {}\n", key, quote(value)));
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "'")))
}

/// Tidies converter output
///
/// Trailing whitespace is stripped, runs of blank lines collapse to one,
/// every heading is preceded by a blank line, and the document ends with a
/// single newline.
pub fn clean_markdown(markdown: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let line = line.trim_end();

        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }

        if line.is_empty() && !in_fence {
            if lines.last().map_or(true, |last| last.is_empty()) {
                continue;
            }
            lines.push(line);
            continue;
        }

        if !in_fence && is_heading(line) && lines.last().map_or(false, |last| !last.is_empty()) {
            lines.push("");
        }
        lines.push(line);
    }

    while lines.last().map_or(false, |last| last.is_empty()) {
        lines.pop();
    }

    let mut cleaned = lines.join("\n");
    cleaned.push('\n');
    cleaned
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> ExtractedPage {
        ExtractedPage {
            metadata: PageMetadata {
                url: "https://example.com/post".to_string(),
                title: "A \"quoted\" title".to_string(),
                date_extracted: "2024-05-01T12:00:00Z".to_string(),
                ..Default::default()
            },
            content_html: html.to_string(),
        }
    }

    #[test]
    fn test_frontmatter_quotes_values() {
        let fm = format_frontmatter(&page("").metadata);
        assert!(fm.starts_with("---\n"));
        assert!(fm.contains("title: \"A \\\"quoted\\\" title\"\n"));
        assert!(fm.contains("source_url: \"https://example.com/post\"\n"));
        assert!(fm.contains("date_extracted: \"2024-05-01T12:00:00Z\"\n"));
        assert!(!fm.contains("author"));
        assert!(!fm.contains("keywords"));
        assert!(fm.ends_with("---\n\n"));
    }

    #[test]
    fn test_frontmatter_optional_fields() {
        let mut metadata = page("").metadata;
        metadata.author = Some("Jane".to_string());
        metadata.date_published = Some("2024-01-01".to_string());
        metadata.keywords = vec!["rust".to_string(), "web".to_string()];

        let fm = format_frontmatter(&metadata);
        assert!(fm.contains("author: \"Jane\"\n"));
        assert!(fm.contains("date_published: \"2024-01-01\"\n"));
        assert!(fm.contains("keywords:\n  - \"rust\"\n  - \"web\"\n"));
    }

    #[test]
    fn test_convert_document() {
        let mut page = page("<h1>Hello</h1><p>First paragraph.</p><script>x()</script>");
        page.metadata.description = Some("Short summary".to_string());

        let markdown = HtmdConverter::new().convert(&page).unwrap();

        assert!(markdown.starts_with("---\n"));
        assert!(markdown.contains("> Short summary\n"));
        assert!(markdown.contains("# Hello"));
        assert!(markdown.contains("First paragraph."));
        assert!(!markdown.contains("x()"));
        assert!(markdown.ends_with('\n'));
    }

    #[test]
    fn test_clean_collapses_blank_lines() {
        let cleaned = clean_markdown("one\n\n\n\ntwo   \n\n\n");
        assert_eq!(cleaned, "one\n\ntwo\n");
    }

    #[test]
    fn test_clean_spaces_headings() {
        let cleaned = clean_markdown("text\n## Section\nbody\n#hashtag");
        assert_eq!(cleaned, "text\n\n## Section\nbody\n#hashtag\n");
    }

    #[test]
    fn test_clean_leaves_code_fences_alone() {
        let cleaned = clean_markdown("```\n# not a heading\n\n\nstill code\n```\n");
        assert_eq!(cleaned, "```\n# not a heading\n\n\nstill code\n```\n");
    }
}
