//! Webmark: a polite website-to-markdown harvester
//!
//! This crate discovers the pages of a website (through its sitemaps, or by
//! following links when no sitemap exists), extracts the main content of each
//! page and saves it as markdown in a directory tree mirroring the site's URLs.
//! Every request honors robots.txt and a per-domain request spacing.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Webmark operations
#[derive(Debug, Error)]
pub enum WebmarkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("No URLs found to process for {base_url}: no sitemap entries and no crawlable pages")]
    NothingToProcess { base_url: String },
}

/// Per-URL fetch failures
///
/// None of these abort a run: callers count them as failed pages and move on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL disallowed by robots.txt: {url}")]
    PermissionDenied { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Server error {status} for {url}")]
    Server { url: String, status: u16 },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Fetch cancelled: {url}")]
    Cancelled { url: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),
}

/// Result type alias for Webmark operations
pub type Result<T> = std::result::Result<T, WebmarkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::{Config, Robots403Policy};
pub use crawler::{run_crawl, Coordinator, DiscoveredPage, Discovery, Strategy};
pub use state::{DomainRegistry, PageOutcome};
pub use url::{domain_key, normalize_url};
