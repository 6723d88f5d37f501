//! State module for tracking crawl progress
//!
//! This module provides state management for domains and pages during a run.
//!
//! # Components
//!
//! - `DomainState`: Per-domain request spacing and the lazily fetched robots.txt entry
//! - `DomainRegistry`: Shared map from domain key to `DomainState`
//! - `PageOutcome`: How the processing of one page ended

mod domain_state;
mod page_state;

// Re-export main types
pub use domain_state::{DomainRegistry, DomainState};
pub use page_state::PageOutcome;
