//! Breadth-first link crawler
//!
//! Used to discover pages when a site publishes no sitemap.

use crate::crawler::fetcher::FetchClient;
use crate::crawler::parser::extract_links;
use crate::url::{normalize_url, should_follow};
use crate::FetchError;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A fetched page: its normalized URL and raw HTML
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub url: Url,
    pub html: String,
}

/// A URL waiting in the frontier with its distance from the seed
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

/// Breadth-first crawler confined to the base URL's host
pub struct CrawlEngine {
    fetcher: Arc<FetchClient>,
    base_url: Url,
    max_depth: u32,
    cancel: CancellationToken,
}

impl CrawlEngine {
    pub fn new(
        fetcher: Arc<FetchClient>,
        base_url: Url,
        max_depth: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            base_url,
            max_depth,
            cancel,
        }
    }

    /// Crawls from the base URL and returns every page fetched successfully
    ///
    /// # Traversal
    ///
    /// 1. Seed the frontier with the normalized base URL at depth 0
    /// 2. Pop the head; skip it if already visited or deeper than `max_depth`
    /// 3. Mark it visited and fetch it
    /// 4. Queue every same-host page link not yet visited at depth + 1
    ///
    /// A failed fetch contributes no page and no links; the crawl goes on.
    /// Cancellation stops the loop and returns the pages collected so far.
    ///
    /// # Returns
    ///
    /// Fetched pages in visit order. Each URL appears once.
    pub async fn crawl(&self) -> Vec<PageRecord> {
        let mut pages = Vec::new();

        let seed = match normalize_url(&self.base_url, "") {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot normalize base URL {}: {}", self.base_url, e);
                return pages;
            }
        };

        let mut frontier: VecDeque<FrontierEntry> = VecDeque::new();
        let mut visited: HashSet<Url> = HashSet::new();
        frontier.push_back(FrontierEntry {
            url: seed,
            depth: 0,
        });

        while let Some(entry) = frontier.pop_front() {
            if self.cancel.is_cancelled() {
                tracing::info!("Crawl interrupted with {} URLs still queued", frontier.len() + 1);
                break;
            }

            if visited.contains(&entry.url) || entry.depth > self.max_depth {
                continue;
            }
            visited.insert(entry.url.clone());

            tracing::info!("Crawling [depth {}]: {}", entry.depth, entry.url);

            let html = match self.fetcher.get_url(&entry.url).await {
                Ok(html) => html,
                Err(FetchError::Cancelled { .. }) => break,
                Err(e) => {
                    tracing::debug!("No content from {}: {}", entry.url, e);
                    continue;
                }
            };

            if entry.depth < self.max_depth {
                let mut queued = 0;
                for link in extract_links(&html, &entry.url) {
                    if visited.contains(&link) || !should_follow(&self.base_url, &link) {
                        continue;
                    }
                    frontier.push_back(FrontierEntry {
                        url: link,
                        depth: entry.depth + 1,
                    });
                    queued += 1;
                }
                tracing::debug!("Queued {} links from {}", queued, entry.url);
            }

            pages.push(PageRecord {
                url: entry.url,
                html,
            });
        }

        tracing::info!(
            "Crawl finished: {} pages fetched, {} URLs visited",
            pages.len(),
            visited.len()
        );
        pages
    }
}
