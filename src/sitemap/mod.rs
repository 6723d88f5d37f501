//! Sitemap discovery
//!
//! This module finds a site's sitemap and flattens it, expanding sitemap
//! indexes recursively, into the list of content URLs it describes.

mod parser;

pub use parser::{parse_sitemap, SitemapDocument};

use crate::crawler::FetchClient;
use crate::url::{looks_like_sitemap, normalize_str};
use crate::FetchError;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use url::Url;

/// Conventional sitemap locations, tried after the ones robots.txt lists
const CONVENTIONAL_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap/",
    "/sitemap/sitemap.xml",
    "/sitemaps/sitemap.xml",
    "/wp-sitemap.xml",
    "/sitemap-index.xml",
];

/// Discovers content URLs through sitemaps
///
/// All fetches go through the shared [`FetchClient`], so sitemap requests
/// obey the same robots.txt rules and request spacing as page requests.
pub struct SitemapResolver {
    fetcher: Arc<FetchClient>,
}

impl SitemapResolver {
    pub fn new(fetcher: Arc<FetchClient>) -> Self {
        Self { fetcher }
    }

    /// Builds the ordered list of sitemap URLs to try
    ///
    /// robots.txt sitemaps come first, then the conventional locations on the
    /// base URL's origin. Duplicates keep their first position.
    pub async fn candidate_urls(&self, base_url: &Url) -> Vec<String> {
        let robots_sitemaps = self.fetcher.gate().sitemaps(base_url).await;
        if !robots_sitemaps.is_empty() {
            tracing::info!("Found {} sitemaps in robots.txt", robots_sitemaps.len());
        }

        let conventional = CONVENTIONAL_PATHS
            .iter()
            .filter_map(|p| base_url.join(p).ok())
            .map(String::from);

        let mut seen = HashSet::new();
        robots_sitemaps
            .into_iter()
            .chain(conventional)
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    /// Resolves the site's sitemaps into content URLs
    ///
    /// # Algorithm
    ///
    /// 1. Try candidates in order until one is a well-formed `urlset` or
    ///    `sitemapindex`; none matching means "no sitemap" and yields nothing
    /// 2. A `urlset` root contributes its locs as content URLs; a
    ///    `sitemapindex` root queues its locs as sitemaps
    /// 3. Expand the queue FIFO, fetching each sitemap once. A nested index
    ///    queues its locs; a nested `urlset` queues its locs if any of them
    ///    looks like a sitemap, otherwise contributes them as content URLs.
    ///    A queued loc that does not look like a sitemap is taken as a
    ///    content URL without being fetched
    ///
    /// A failed nested fetch abandons that branch only.
    ///
    /// # Returns
    ///
    /// Normalized content URLs in discovery order, each once. May be empty.
    pub async fn resolve(&self, base_url: &Url) -> Vec<Url> {
        let candidates = self.candidate_urls(base_url).await;

        let Some((root_url, root)) = self.find_root(&candidates).await else {
            tracing::warn!("No sitemap found for {}", base_url);
            return Vec::new();
        };

        let mut processed: HashSet<String> = HashSet::new();
        processed.insert(root_url);

        let mut queue: VecDeque<String> = VecDeque::new();
        let mut results = UrlCollector::default();

        match root {
            SitemapDocument::Index(locs) => {
                tracing::info!("Found sitemap index with {} sitemaps", locs.len());
                queue.extend(locs);
            }
            SitemapDocument::UrlSet(locs) => {
                tracing::info!("Found sitemap with {} URLs", locs.len());
                results.extend(locs);
            }
        }

        while let Some(sitemap_url) = queue.pop_front() {
            if !looks_like_sitemap(&sitemap_url) {
                results.push(&sitemap_url);
                continue;
            }
            if !processed.insert(sitemap_url.clone()) {
                tracing::debug!("Skipping already processed sitemap: {}", sitemap_url);
                continue;
            }

            tracing::info!("Fetching nested sitemap: {}", sitemap_url);
            let body = match self.fetcher.get(&sitemap_url).await {
                Ok(body) => body,
                Err(FetchError::Cancelled { .. }) => break,
                Err(e) => {
                    tracing::warn!("Error processing nested sitemap {}: {}", sitemap_url, e);
                    continue;
                }
            };

            match parse_sitemap(&body) {
                Some(SitemapDocument::Index(locs)) => queue.extend(locs),
                Some(SitemapDocument::UrlSet(locs)) => {
                    if locs.iter().any(|loc| looks_like_sitemap(loc)) {
                        queue.extend(locs);
                    } else {
                        results.extend(locs);
                    }
                }
                None => tracing::warn!("Nested sitemap {} is not valid sitemap XML", sitemap_url),
            }
        }

        let urls = results.into_urls();
        tracing::info!("Extracted {} URLs from sitemaps", urls.len());
        urls
    }

    /// Fetches candidates in order and returns the first valid sitemap
    async fn find_root(&self, candidates: &[String]) -> Option<(String, SitemapDocument)> {
        for candidate in candidates {
            tracing::info!("Attempting to fetch sitemap from: {}", candidate);
            match self.fetcher.get(candidate).await {
                Ok(body) => {
                    if let Some(doc) = parse_sitemap(&body) {
                        tracing::info!("Found sitemap at: {}", candidate);
                        return Some((candidate.clone(), doc));
                    }
                    tracing::debug!("Found non-sitemap content at {}", candidate);
                }
                Err(FetchError::Cancelled { .. }) => return None,
                Err(e) => tracing::debug!("Failed to fetch sitemap from {}: {}", candidate, e),
            }
        }
        None
    }
}

/// Ordered, deduplicated set of normalized content URLs
#[derive(Default)]
struct UrlCollector {
    seen: HashSet<Url>,
    urls: Vec<Url>,
}

impl UrlCollector {
    fn extend(&mut self, locs: Vec<String>) {
        for loc in locs {
            self.push(&loc);
        }
    }

    fn push(&mut self, loc: &str) {
        match normalize_str(loc) {
            Ok(url) => {
                if self.seen.insert(url.clone()) {
                    self.urls.push(url);
                }
            }
            Err(e) => tracing::debug!("Ignoring invalid sitemap entry {:?}: {}", loc, e),
        }
    }

    fn into_urls(self) -> Vec<Url> {
        self.urls
    }
}
