//! Output module for turning fetched pages into markdown files
//!
//! This module handles:
//! - Extracting the main content and metadata of a page
//! - Converting the content to markdown with frontmatter
//! - Writing documents to disk
//! - Recording run statistics

mod extract;
mod files;
mod markdown;
pub mod stats;
mod traits;

pub use extract::{clean_content, extract_metadata, HeuristicExtractor};
pub use files::{sanitize_filename, FileStore};
pub use markdown::{clean_markdown, format_frontmatter, HtmdConverter};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{
    ContentExtractor, DocumentStore, ExtractedPage, MarkdownConverter, OutputError, OutputResult,
    PageMetadata,
};

use crate::config::Config;
use crate::state::PageOutcome;
use std::sync::Arc;

/// The extract, convert and save stages applied to every fetched page
#[derive(Clone)]
pub struct Pipeline {
    extractor: Arc<dyn ContentExtractor>,
    converter: Arc<dyn MarkdownConverter>,
    store: Arc<dyn DocumentStore>,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        converter: Arc<dyn MarkdownConverter>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            extractor,
            converter,
            store,
        }
    }

    /// Builds the default pipeline writing to the configured output directory
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HeuristicExtractor::default()),
            Arc::new(HtmdConverter::new()),
            Arc::new(FileStore::new(
                &config.output.directory,
                config.output.include_domain,
            )),
        )
    }

    /// Runs one page through every stage
    ///
    /// # Returns
    ///
    /// * `PageOutcome::Saved` - The markdown was written
    /// * `PageOutcome::NoContent` - Nothing worth keeping was found
    /// * `PageOutcome::ConversionFailed` / `PageOutcome::SaveFailed` - A stage failed
    pub fn process(&self, url: &str, html: &str) -> PageOutcome {
        let Some(page) = self.extractor.extract(html, url) else {
            tracing::warn!("No content extracted from {}", url);
            return PageOutcome::NoContent;
        };

        let markdown = match self.converter.convert(&page) {
            Ok(markdown) => markdown,
            Err(e) => {
                tracing::error!("Failed to convert {}: {}", url, e);
                return PageOutcome::ConversionFailed;
            }
        };

        match self.store.save(&markdown, url) {
            Ok(path) => {
                tracing::debug!("Processed {} -> {}", url, path.display());
                PageOutcome::Saved
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", url, e);
                PageOutcome::SaveFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FailingConverter;

    impl MarkdownConverter for FailingConverter {
        fn convert(&self, _page: &ExtractedPage) -> OutputResult<String> {
            Err(OutputError::Conversion("boom".to_string()))
        }
    }

    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn save(&self, _markdown: &str, _url: &str) -> OutputResult<PathBuf> {
            Err(OutputError::Write("disk full".to_string()))
        }
    }

    const PAGE: &str = "<html><head><title>Guide</title></head><body><main><p>Plenty of words in this paragraph to make it the main content of the page being processed.</p></main></body></html>";

    #[test]
    fn test_process_saves_page() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::for_site("https://example.com");
        config.output.directory = dir.path().to_string_lossy().into_owned();

        let pipeline = Pipeline::from_config(&config);
        let outcome = pipeline.process("https://example.com/guide", PAGE);

        assert_eq!(outcome, PageOutcome::Saved);
        let written = std::fs::read_to_string(dir.path().join("example.com/guide.md")).unwrap();
        assert!(written.contains("title: \"Guide\""));
        assert!(written.contains("Plenty of words"));
    }

    #[test]
    fn test_process_no_content() {
        let pipeline = Pipeline::new(
            Arc::new(HeuristicExtractor::default()),
            Arc::new(HtmdConverter::new()),
            Arc::new(FailingStore),
        );
        assert_eq!(pipeline.process("https://example.com/", ""), PageOutcome::NoContent);
    }

    #[test]
    fn test_process_stage_failures() {
        let conversion = Pipeline::new(
            Arc::new(HeuristicExtractor::default()),
            Arc::new(FailingConverter),
            Arc::new(FailingStore),
        );
        assert_eq!(
            conversion.process("https://example.com/", PAGE),
            PageOutcome::ConversionFailed
        );

        let saving = Pipeline::new(
            Arc::new(HeuristicExtractor::default()),
            Arc::new(HtmdConverter::new()),
            Arc::new(FailingStore),
        );
        assert_eq!(saving.process("https://example.com/", PAGE), PageOutcome::SaveFailed);
    }
}
