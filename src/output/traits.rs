//! Processing pipeline traits and types
//!
//! This module defines the trait interfaces for the three stages every
//! discovered page goes through (extraction, conversion, storage) and the
//! data passed between them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to extract content: {0}")]
    Extraction(String),

    #[error("Failed to convert to markdown: {0}")]
    Conversion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write output: {0}")]
    Write(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Metadata extracted from a page's head and markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// The page URL
    pub url: String,

    /// Page title; "Untitled" when the page names none
    pub title: String,

    pub description: Option<String>,

    pub keywords: Vec<String>,

    /// When the page was extracted (RFC 3339)
    pub date_extracted: String,

    /// Publication date as written by the page
    pub date_published: Option<String>,

    pub author: Option<String>,
}

/// The main content of a page, cleaned of chrome, plus its metadata
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub metadata: PageMetadata,

    /// Serialized HTML of the cleaned main-content element
    pub content_html: String,
}

/// Selects and cleans the main content of a page
pub trait ContentExtractor: Send + Sync {
    /// Extracts metadata and main content from raw HTML
    ///
    /// # Returns
    ///
    /// * `Some(ExtractedPage)` - Content was found
    /// * `None` - The page has no usable content
    fn extract(&self, html: &str, url: &str) -> Option<ExtractedPage>;
}

/// Renders extracted content as a markdown document
pub trait MarkdownConverter: Send + Sync {
    /// Converts a page to markdown, including its frontmatter header
    fn convert(&self, page: &ExtractedPage) -> OutputResult<String>;
}

/// Persists markdown documents
pub trait DocumentStore: Send + Sync {
    /// Saves the markdown for `url`
    ///
    /// # Returns
    ///
    /// The path the document was written to
    fn save(&self, markdown: &str, url: &str) -> OutputResult<PathBuf>;
}
