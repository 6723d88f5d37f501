//! Robots.txt handling module
//!
//! This module fetches and parses robots.txt files. Every failure mode
//! resolves to a usable ruleset: fetching robots.txt never aborts a crawl.

mod parser;

pub use parser::{agent_token, RobotsRuleset};

use crate::config::Robots403Policy;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};

/// Crawl delay applied to domains whose robots.txt answered 403 (seconds)
pub const DENIED_CRAWL_DELAY: f64 = 10.0;

/// Sitemap locations suggested for domains whose robots.txt answered 403
const CONVENTIONAL_SITEMAPS: &[&str] = &["/sitemap.xml", "/wp-sitemap.xml", "/sitemap_index.xml"];

/// How a domain's ruleset was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotsStatus {
    /// robots.txt fetched and parsed on the first attempt
    Parsed,
    /// robots.txt fetched and parsed by the plain retry
    Retried,
    /// robots.txt answered HTTP 403; the configured policy applies
    Denied,
    /// robots.txt unavailable; everything is allowed
    Default,
}

impl RobotsStatus {
    /// Returns the string representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Retried => "retried",
            Self::Denied => "denied",
            Self::Default => "default",
        }
    }
}

/// A domain's ruleset together with how it was obtained
#[derive(Debug, Clone)]
pub struct RobotsEntry {
    pub ruleset: RobotsRuleset,
    pub status: RobotsStatus,
}

impl RobotsEntry {
    pub fn new(ruleset: RobotsRuleset, status: RobotsStatus) -> Self {
        Self { ruleset, status }
    }

    /// Entry used when robots.txt is not consulted at all
    pub fn permissive() -> Self {
        Self::new(RobotsRuleset::allow_all(), RobotsStatus::Default)
    }

    pub fn is_denied(&self) -> bool {
        self.status == RobotsStatus::Denied
    }

    /// Effective robots crawl delay in seconds
    ///
    /// Robots-denied domains always get [`DENIED_CRAWL_DELAY`].
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.is_denied() {
            return Some(DENIED_CRAWL_DELAY);
        }
        self.ruleset.crawl_delay(user_agent)
    }
}

/// Fetches and parses robots.txt for an origin
///
/// # Fallback chain
///
/// 1. GET `<origin>/robots.txt` with browser-like headers. 2xx is parsed,
///    403 applies `policy`, any other status allows everything.
/// 2. If the first attempt failed at the network level, retry once with a
///    plain request carrying only the user agent.
/// 3. If both attempts fail, allow everything.
///
/// # Arguments
///
/// * `client` - HTTP client to use
/// * `origin` - The domain key, `scheme://host[:port]`
/// * `user_agent` - The configured user agent
/// * `policy` - What to do when robots.txt answers 403
pub async fn fetch_robots(
    client: &Client,
    origin: &str,
    user_agent: &str,
    policy: Robots403Policy,
) -> RobotsEntry {
    let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
    tracing::debug!("Fetching robots.txt from {}", robots_url);

    let first = client
        .get(&robots_url)
        .header(USER_AGENT, user_agent)
        .header(ACCEPT, "text/plain,text/html;q=0.9,*/*;q=0.8")
        .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .send()
        .await;

    let (response, status_on_success) = match first {
        Ok(response) => (response, RobotsStatus::Parsed),
        Err(e) => {
            tracing::warn!("Error fetching robots.txt from {}: {}; retrying", origin, e);
            match client
                .get(&robots_url)
                .header(USER_AGENT, user_agent)
                .send()
                .await
            {
                Ok(response) => (response, RobotsStatus::Retried),
                Err(e) => {
                    tracing::warn!(
                        "Retry for robots.txt from {} failed: {}; allowing all paths",
                        origin,
                        e
                    );
                    return RobotsEntry::permissive();
                }
            }
        }
    };

    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        tracing::warn!(
            "Access to robots.txt forbidden (403) for {}. Using {:?} policy",
            origin,
            policy
        );
        return denied_entry(origin, policy);
    }

    if !status.is_success() {
        tracing::info!(
            "robots.txt for {} returned HTTP {}; allowing all paths",
            origin,
            status.as_u16()
        );
        return RobotsEntry::permissive();
    }

    match response.text().await {
        Ok(content) => {
            let ruleset = RobotsRuleset::from_content(&content);
            if let Some(delay) = ruleset.crawl_delay(user_agent) {
                tracing::info!("Found crawl delay of {}s for {}", delay, origin);
            }
            for sitemap in ruleset.sitemaps() {
                tracing::info!("Found sitemap in robots.txt: {}", sitemap);
            }
            RobotsEntry::new(ruleset, status_on_success)
        }
        Err(e) => {
            tracing::warn!("Failed to read robots.txt body from {}: {}", origin, e);
            RobotsEntry::permissive()
        }
    }
}

/// Builds the entry for a domain whose robots.txt answered 403
pub fn denied_entry(origin: &str, policy: Robots403Policy) -> RobotsEntry {
    let ruleset = match policy {
        Robots403Policy::Allow => RobotsRuleset::allow_all(),
        Robots403Policy::Conservative => RobotsRuleset::conservative(),
    };
    RobotsEntry::new(
        ruleset.with_sitemaps(conventional_sitemaps(origin)),
        RobotsStatus::Denied,
    )
}

/// Returns the conventional sitemap locations for an origin
pub fn conventional_sitemaps(origin: &str) -> Vec<String> {
    let origin = origin.trim_end_matches('/');
    CONVENTIONAL_SITEMAPS
        .iter()
        .map(|path| format!("{}{}", origin, path))
        .collect()
}
