use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Webmark
///
/// Every section has defaults, so a TOML file only needs the keys it
/// changes. The base URL usually comes from the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Creates a default configuration for the given site
    pub fn for_site(base_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                base_url: base_url.into(),
            },
            ..Self::default()
        }
    }
}

/// The site being harvested
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root URL of the website
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// What to do with a domain whose robots.txt answers HTTP 403
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Robots403Policy {
    /// Allow every path
    #[default]
    Allow,
    /// Allow only the root, index, sitemap and robots paths
    Conservative,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link-hops followed from the base URL when crawling
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Minimum time between requests to the same domain (seconds)
    #[serde(rename = "request-delay")]
    pub request_delay: f64,

    /// Upper bound of the courtesy backoff after a server error (seconds)
    #[serde(rename = "max-backoff-delay")]
    pub max_backoff_delay: f64,

    /// Whether robots.txt is consulted at all
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,

    /// Never fall back to link crawling when no sitemap is found
    #[serde(rename = "sitemap-only")]
    pub sitemap_only: bool,

    #[serde(rename = "robots-403-policy")]
    pub robots_403_policy: Robots403Policy,

    /// Number of pages processed concurrently
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay.max(0.0))
    }

    pub fn max_backoff_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_backoff_delay.max(0.0))
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            request_delay: 1.0,
            max_backoff_delay: 3.0,
            respect_robots: true,
            sitemap_only: false,
            robots_403_policy: Robots403Policy::Allow,
            max_concurrent_pages: 4,
            request_timeout: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    pub name: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "WebToMarkdown/1.0".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the markdown tree is written to
    pub directory: String,

    /// Nest files under a directory named after the page's host
    #[serde(rename = "include-domain")]
    pub include_domain: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            include_domain: true,
        }
    }
}
