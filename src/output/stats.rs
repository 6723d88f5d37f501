//! Run statistics
//!
//! This module tallies page outcomes over a run and prints the final
//! summary.

use crate::crawler::Strategy;
use crate::state::PageOutcome;
use std::collections::HashMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// The site that was processed
    pub base_url: String,

    /// How the pages were discovered
    pub strategy: Strategy,

    /// Number of pages discovered
    pub discovered: u64,

    /// Number of pages saved
    pub succeeded: u64,

    /// Number of pages that ended in an error outcome
    pub failed: u64,

    /// Count of pages by outcome
    pub outcomes: HashMap<PageOutcome, u64>,

    /// Whether the run was cancelled before every page was processed
    pub interrupted: bool,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlStatistics {
    pub fn new(base_url: impl Into<String>, strategy: Strategy, discovered: u64) -> Self {
        Self {
            base_url: base_url.into(),
            strategy,
            discovered,
            succeeded: 0,
            failed: 0,
            outcomes: HashMap::new(),
            interrupted: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Records the outcome of one page
    pub fn record(&mut self, outcome: PageOutcome) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else if outcome.is_error() {
            self.failed += 1;
        }
    }

    /// Returns how many pages ended with `outcome`
    pub fn count(&self, outcome: PageOutcome) -> u64 {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Number of pages that reached a success or error outcome
    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Percentage of discovered pages that were saved
    pub fn success_rate(&self) -> f64 {
        if self.discovered == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.discovered as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Site: {}", stats.base_url);
    println!("  Strategy: {}", stats.strategy);
    println!("  Pages discovered: {}", stats.discovered);
    println!("  Pages saved: {}", stats.succeeded);
    println!("  Pages failed: {}", stats.failed);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    if !stats.outcomes.is_empty() {
        println!("Pages by Outcome:");
        for outcome in PageOutcome::ALL {
            let count = stats.count(outcome);
            if count > 0 {
                println!("  {}: {}", outcome, count);
            }
        }
        println!();
    }

    if stats.interrupted {
        let unfinished = stats.discovered.saturating_sub(stats.processed());
        println!("Run interrupted: {} pages not processed\n", unfinished);
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages saved)",
        stats.success_rate(),
        stats.succeeded,
        stats.discovered
    );
}
