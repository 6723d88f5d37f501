//! Politeness gate for robots.txt permissions and per-domain request spacing
//!
//! This module handles:
//! - Lazily fetching and caching one robots.txt ruleset per domain
//! - Deciding whether a URL may be fetched
//! - Spacing requests to the same domain by the effective crawl delay
//! - Exposing the sitemap hints found in robots.txt

use crate::config::{Config, Robots403Policy};
use crate::robots::{fetch_robots, RobotsEntry, RobotsRuleset};
use crate::state::DomainRegistry;
use crate::url::domain_key;
use crate::{FetchError, FetchResult};
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Upper bound of the random jitter added to every wait (seconds)
pub const MAX_JITTER_SECS: f64 = 0.5;

/// Sitemap filenames that are fetched even when robots.txt disallows them
const COMMON_SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/wp-sitemap.xml", "/sitemap_index.xml"];

/// Enforces robots.txt rules and per-domain request spacing
///
/// A single gate is shared by every component that fetches, so a domain's
/// ruleset and last-request time apply no matter who issues the request.
pub struct PolitenessGate {
    client: Client,
    registry: Arc<DomainRegistry>,
    user_agent: String,
    request_delay: Duration,
    respect_robots: bool,
    robots_403_policy: Robots403Policy,
    cancel: CancellationToken,
}

impl PolitenessGate {
    /// Creates a new gate
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests
    /// * `config` - The run configuration
    /// * `registry` - Shared per-domain state
    /// * `cancel` - Token that aborts pending waits
    pub fn new(
        client: Client,
        config: &Config,
        registry: Arc<DomainRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            registry,
            user_agent: config.user_agent.name.clone(),
            request_delay: config.crawler.request_delay(),
            respect_robots: config.crawler.respect_robots,
            robots_403_policy: config.crawler.robots_403_policy,
            cancel,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the robots entry for the URL's domain, fetching it on first use
    ///
    /// Never fails: robots.txt problems resolve to a permissive or
    /// policy-driven ruleset. When robots.txt is not respected, or the run is
    /// cancelled mid-fetch, a permissive entry is returned without caching.
    pub async fn robots_entry(&self, url: &Url) -> RobotsEntry {
        if !self.respect_robots {
            return RobotsEntry::permissive();
        }

        let Some(key) = domain_key(url) else {
            return RobotsEntry::permissive();
        };

        let state = self.registry.get_or_create(&key);
        let init = || async {
            tracing::info!("Initializing robots.txt rules for domain: {}", key);
            fetch_robots(&self.client, &key, &self.user_agent, self.robots_403_policy).await
        };

        tokio::select! {
            entry = state.robots_or_init(init) => entry.clone(),
            _ = self.cancel.cancelled() => RobotsEntry::permissive(),
        }
    }

    /// Returns the robots ruleset for the URL's domain
    pub async fn ruleset(&self, url: &Url) -> RobotsRuleset {
        self.robots_entry(url).await.ruleset
    }

    /// Checks whether robots.txt allows fetching the URL
    ///
    /// Sitemaps listed in robots.txt, common sitemap filenames and the site
    /// root are always allowed, even if the ruleset denies them.
    pub async fn can_fetch(&self, url: &Url) -> bool {
        if !self.respect_robots {
            return true;
        }

        let entry = self.robots_entry(url).await;
        let ruleset = &entry.ruleset;

        if ruleset.lists_sitemap(url.as_str()) {
            tracing::debug!("Explicitly allowing sitemap from robots.txt: {}", url);
            return true;
        }

        if ruleset.is_allowed(url.as_str(), &self.user_agent) {
            tracing::trace!("Allowed by robots.txt: {}", url);
            return true;
        }

        let path = url.path();
        if COMMON_SITEMAP_PATHS.iter().any(|p| path.ends_with(p)) {
            tracing::warn!("Allowing common sitemap URL despite robots.txt: {}", url);
            return true;
        }

        if path.is_empty() || path == "/" {
            tracing::warn!(
                "Root path disallowed by robots.txt, treating as a parser error: {}",
                url
            );
            return true;
        }

        tracing::warn!("Disallowed by robots.txt: {}", url);
        false
    }

    /// Returns the sitemap URLs robots.txt suggests for the URL's domain
    pub async fn sitemaps(&self, url: &Url) -> Vec<String> {
        if !self.respect_robots {
            return Vec::new();
        }
        self.robots_entry(url).await.ruleset.sitemaps().to_vec()
    }

    /// Returns `max(request delay, robots crawl delay)` for the URL's domain
    pub async fn effective_delay(&self, url: &Url) -> Duration {
        if !self.respect_robots {
            return self.request_delay;
        }

        let entry = self.robots_entry(url).await;
        match entry.crawl_delay(&self.user_agent) {
            Some(secs) => self.request_delay.max(Duration::from_secs_f64(secs)),
            None => self.request_delay,
        }
    }

    /// Waits until the URL's domain may receive another request
    ///
    /// Callers for the same domain are released one at a time, each at least
    /// the effective delay (plus jitter) after the previous one. Callers for
    /// different domains never wait on each other.
    ///
    /// # Returns
    ///
    /// * `Ok(Duration)` - How long the caller slept
    /// * `Err(FetchError::Cancelled)` - The run was cancelled while waiting
    pub async fn wait_if_needed(&self, url: &Url) -> FetchResult<Duration> {
        let Some(key) = domain_key(url) else {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        };

        let delay = self.effective_delay(url).await;
        let state = self.registry.get_or_create(&key);
        let jitter = random_jitter();

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled {
                url: url.to_string(),
            }),
            waited = state.acquire_slot(delay, jitter) => {
                if !waited.is_zero() {
                    tracing::debug!("Waited {:.2}s before requesting {}", waited.as_secs_f64(), url);
                }
                Ok(waited)
            }
        }
    }
}

/// Random jitter in `[0, MAX_JITTER_SECS)`
pub fn random_jitter() -> Duration {
    Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..MAX_JITTER_SECS))
}
