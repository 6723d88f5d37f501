//! URL handling module for Webmark
//!
//! This module provides URL normalization, politeness keys, same-site checks
//! and the filters that decide which discovered links are worth fetching.

mod domain;
mod filter;
mod normalize;

use ::url::Url;

// Re-export main functions
pub use domain::{domain_key, extract_domain, is_same_domain};
pub use filter::{is_crawlable, looks_like_sitemap};
pub use normalize::{normalize_str, normalize_url};

/// Returns true if a discovered link should join the crawl frontier
///
/// The link must stay on the base URL's host and look like a page.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webmark::url::should_follow;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// assert!(should_follow(&base, &Url::parse("https://example.com/about").unwrap()));
/// assert!(!should_follow(&base, &Url::parse("https://example.com/logo.png").unwrap()));
/// assert!(!should_follow(&base, &Url::parse("https://elsewhere.org/").unwrap()));
/// ```
pub fn should_follow(base: &Url, link: &Url) -> bool {
    is_same_domain(base, link) && is_crawlable(link)
}
