//! Crawler module for page discovery and fetching
//!
//! This module contains the core crawling logic, including:
//! - robots.txt enforcement and per-domain request spacing
//! - HTTP fetching with courtesy backoff on server errors
//! - HTML link extraction and breadth-first crawling
//! - Overall run coordination

mod coordinator;
mod engine;
mod fetcher;
mod parser;
mod politeness;

pub use coordinator::{run_crawl, Coordinator, DiscoveredPage, Discovery, Strategy};
pub use engine::{CrawlEngine, FrontierEntry, PageRecord};
pub use fetcher::{build_http_client, FetchClient};
pub use parser::extract_links;
pub use politeness::{random_jitter, PolitenessGate, MAX_JITTER_SECS};
