//! Crawl coordinator - main orchestration logic
//!
//! This module ties the pieces of a run together:
//! - Choosing a discovery strategy (sitemaps, falling back to link crawling)
//! - Processing discovered pages with a bounded worker pool
//! - Handling interrupts and reporting statistics

use crate::config::{validate, Config};
use crate::crawler::engine::CrawlEngine;
use crate::crawler::fetcher::{build_http_client, FetchClient};
use crate::crawler::politeness::PolitenessGate;
use crate::output::{CrawlStatistics, Pipeline};
use crate::sitemap::SitemapResolver;
use crate::state::{DomainRegistry, PageOutcome};
use crate::WebmarkError;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How a run discovered its pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sitemap,
    Crawl,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::Crawl => "crawl",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page to process, with its HTML if discovery already fetched it
#[derive(Debug, Clone)]
pub struct DiscoveredPage {
    pub url: Url,
    pub html: Option<String>,
}

/// The pages a run will process and how they were found
#[derive(Debug, Clone)]
pub struct Discovery {
    pub strategy: Strategy,
    pub pages: Vec<DiscoveredPage>,
}

/// Main crawl coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    base_url: Url,
    fetcher: Arc<FetchClient>,
    pipeline: Pipeline,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Builds the HTTP client and the politeness state shared by every
    /// request of the run.
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    /// * `cancel` - Token that interrupts the run when cancelled
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self, WebmarkError> {
        let base_url = Url::parse(&config.site.base_url)?;
        let client = build_http_client(&config)?;

        let registry = Arc::new(DomainRegistry::new());
        let gate = Arc::new(PolitenessGate::new(
            client.clone(),
            &config,
            registry,
            cancel.clone(),
        ));
        let fetcher = Arc::new(FetchClient::new(client, gate, &config, cancel.clone()));
        let pipeline = Pipeline::from_config(&config);

        Ok(Self {
            config: Arc::new(config),
            base_url,
            fetcher,
            pipeline,
            cancel,
        })
    }

    /// Replaces the page processing pipeline
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Finds the pages to process
    ///
    /// Sitemaps are tried first. When they yield nothing and sitemap-only
    /// mode is off, the site is crawled from the base URL instead; crawled
    /// pages keep the HTML already fetched so no URL is requested twice.
    ///
    /// # Returns
    ///
    /// * `Ok(Discovery)` - At least one page was found
    /// * `Err(WebmarkError::NothingToProcess)` - Neither strategy found anything
    pub async fn discover(&self) -> Result<Discovery, WebmarkError> {
        tracing::info!("Discovering pages of {}", self.base_url);

        let resolver = SitemapResolver::new(Arc::clone(&self.fetcher));
        let urls = resolver.resolve(&self.base_url).await;

        if !urls.is_empty() {
            tracing::info!("Using {} URLs from sitemaps", urls.len());
            return Ok(Discovery {
                strategy: Strategy::Sitemap,
                pages: urls
                    .into_iter()
                    .map(|url| DiscoveredPage { url, html: None })
                    .collect(),
            });
        }

        if self.config.crawler.sitemap_only {
            tracing::warn!("No sitemap URLs found and sitemap-only mode is set");
            return Err(self.nothing_to_process());
        }

        tracing::info!(
            "No sitemap URLs found, crawling from {} (max depth {})",
            self.base_url,
            self.config.crawler.max_depth
        );
        let engine = CrawlEngine::new(
            Arc::clone(&self.fetcher),
            self.base_url.clone(),
            self.config.crawler.max_depth,
            self.cancel.clone(),
        );
        let pages = engine.crawl().await;

        if pages.is_empty() {
            return Err(self.nothing_to_process());
        }

        Ok(Discovery {
            strategy: Strategy::Crawl,
            pages: pages
                .into_iter()
                .map(|page| DiscoveredPage {
                    url: page.url,
                    html: Some(page.html),
                })
                .collect(),
        })
    }

    /// Runs discovery, then processes every discovered page
    pub async fn run(&self) -> Result<CrawlStatistics, WebmarkError> {
        let started = Instant::now();
        let discovery = self.discover().await?;

        let mut stats = self.process(discovery).await;
        stats.elapsed = started.elapsed();
        Ok(stats)
    }

    /// Processes discovered pages through the pipeline
    ///
    /// Up to `max-concurrent-pages` pages are in flight at once; requests to
    /// one domain are still spaced by the politeness gate. Once the run is
    /// cancelled no new page is started, and pages never started are counted
    /// as cancelled.
    pub async fn process(&self, discovery: Discovery) -> CrawlStatistics {
        let started = Instant::now();
        let total = discovery.pages.len();
        let mut stats =
            CrawlStatistics::new(self.base_url.as_str(), discovery.strategy, total as u64);

        let limit = self.config.crawler.max_concurrent_pages.max(1) as usize;
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();
        let mut pages = discovery.pages.into_iter();

        tracing::info!(
            "Processing {} pages ({} strategy, {} at a time)",
            total,
            stats.strategy,
            limit
        );

        for page in pages.by_ref() {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    stats.record(PageOutcome::Cancelled);
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let fetcher = Arc::clone(&self.fetcher);
            let pipeline = self.pipeline.clone();
            tasks.spawn(async move {
                let _permit = permit;
                process_page(fetcher, pipeline, page).await
            });
        }

        for _ in pages {
            stats.record(PageOutcome::Cancelled);
        }

        let mut done = 0;
        while let Some(joined) = tasks.join_next().await {
            done += 1;
            match joined {
                Ok((url, outcome)) => {
                    tracing::info!("[{}/{}] {}: {}", done, total, outcome, url);
                    stats.record(outcome);
                }
                Err(e) => {
                    tracing::error!("Page task failed: {}", e);
                    stats.record(PageOutcome::ConversionFailed);
                }
            }
        }

        stats.interrupted = self.cancel.is_cancelled();
        stats.elapsed = started.elapsed();

        tracing::info!(
            "Processed {} pages: {} saved, {} failed{}",
            stats.processed(),
            stats.succeeded,
            stats.failed,
            if stats.interrupted { " (interrupted)" } else { "" }
        );
        stats
    }

    fn nothing_to_process(&self) -> WebmarkError {
        WebmarkError::NothingToProcess {
            base_url: self.base_url.to_string(),
        }
    }
}

/// Fetches a page if needed and runs it through the pipeline
async fn process_page(
    fetcher: Arc<FetchClient>,
    pipeline: Pipeline,
    page: DiscoveredPage,
) -> (Url, PageOutcome) {
    let html = match page.html {
        Some(html) => html,
        None => match fetcher.get_url(&page.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", page.url, e);
                return (page.url, PageOutcome::from(&e));
            }
        },
    };

    let url = page.url.to_string();
    let outcome = tokio::task::spawn_blocking(move || pipeline.process(&url, &html)).await;

    match outcome {
        Ok(outcome) => (page.url, outcome),
        Err(e) => {
            tracing::error!("Processing {} panicked: {}", page.url, e);
            (page.url, PageOutcome::ConversionFailed)
        }
    }
}

/// Runs a complete harvest of one site
///
/// This is the main library entry point:
///
/// 1. Validate the configuration, then build the HTTP client and
///    politeness state
/// 2. Discover pages through sitemaps, or crawl for them
/// 3. Fetch, extract, convert and save every page
/// 4. Return the run statistics
///
/// # Example
///
/// ```no_run
/// use webmark::config::Config;
/// use webmark::run_crawl;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::for_site("https://example.com");
/// let stats = run_crawl(config, CancellationToken::new()).await?;
/// println!("saved {} pages", stats.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    cancel: CancellationToken,
) -> crate::Result<CrawlStatistics> {
    validate(&config)?;
    let coordinator = Coordinator::new(config, cancel)?;
    coordinator.run().await
}
