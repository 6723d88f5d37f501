use crate::robots::RobotsEntry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;

/// Tracks the politeness state of one domain
///
/// Shared by every task that fetches from the domain. The last-request
/// timestamp sits behind an async mutex that is held across the wait, so
/// concurrent callers are released one at a time, each at least one delay
/// after the previous. The robots.txt entry is fetched at most once.
#[derive(Debug, Default)]
pub struct DomainState {
    /// When the most recent request to this domain was released
    last_request: Mutex<Option<Instant>>,

    /// Lazily fetched robots.txt ruleset for this domain
    robots: OnceCell<RobotsEntry>,
}

impl DomainState {
    /// Creates a new DomainState with no request history
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the robots entry, running `init` if it was never fetched
    ///
    /// Concurrent callers share a single `init` run. If the future running
    /// `init` is dropped, a later caller runs it again.
    pub async fn robots_or_init<F, Fut>(&self, init: F) -> &RobotsEntry
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RobotsEntry>,
    {
        self.robots.get_or_init(init).await
    }

    /// Returns the robots entry if it has been fetched
    pub fn robots(&self) -> Option<&RobotsEntry> {
        self.robots.get()
    }

    /// Waits until `delay` has elapsed since the previous request, then
    /// records the current instant as the new last request
    ///
    /// `jitter` is added only when a wait is actually needed; the first
    /// request to a domain goes out immediately.
    ///
    /// # Returns
    ///
    /// How long the caller slept, excluding time spent queued on the lock
    pub async fn acquire_slot(&self, delay: Duration, jitter: Duration) -> Duration {
        let mut last = self.last_request.lock().await;

        let mut waited = Duration::ZERO;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                waited = delay - elapsed + jitter;
                tokio::time::sleep(waited).await;
            }
        }

        *last = Some(Instant::now());
        waited
    }

    /// Returns when the last request was released, if any
    pub async fn last_request(&self) -> Option<Instant> {
        *self.last_request.lock().await
    }
}

/// Registry of per-domain state, keyed by origin
///
/// Lookups take a short synchronous read lock; the returned `Arc` is used
/// without holding it, so different domains never wait on each other.
#[derive(Debug, Default)]
pub struct DomainRegistry {
    domains: RwLock<HashMap<String, Arc<DomainState>>>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state for `domain`, creating it on first use
    pub fn get_or_create(&self, domain: &str) -> Arc<DomainState> {
        if let Some(state) = self.get(domain) {
            return state;
        }

        let mut domains = self.domains.write().unwrap_or_else(PoisonError::into_inner);
        domains
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(DomainState::new()))
            .clone()
    }

    /// Returns the state for `domain` if it has been seen
    pub fn get(&self, domain: &str) -> Option<Arc<DomainState>> {
        let domains = self.domains.read().unwrap_or_else(PoisonError::into_inner);
        domains.get(domain).cloned()
    }

    /// Number of domains seen so far
    pub fn len(&self) -> usize {
        self.domains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::{RobotsRuleset, RobotsStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_first_request_does_not_wait() {
        let state = DomainState::new();
        let waited = state
            .acquire_slot(Duration::from_secs(1), Duration::from_millis(300))
            .await;
        assert_eq!(waited, Duration::ZERO);
        assert!(state.last_request().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_waits_delay_plus_jitter() {
        let state = DomainState::new();
        let delay = Duration::from_secs(2);
        let jitter = Duration::from_millis(250);

        state.acquire_slot(delay, jitter).await;
        let start = Instant::now();
        let waited = state.acquire_slot(delay, jitter).await;

        assert_eq!(waited, delay + jitter);
        assert!(start.elapsed() >= delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_delay_elapsed() {
        let state = DomainState::new();
        let delay = Duration::from_secs(1);

        state.acquire_slot(delay, Duration::ZERO).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        let waited = state.acquire_slot(delay, Duration::from_millis(400)).await;

        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_are_spaced() {
        let state = Arc::new(DomainState::new());
        let delay = Duration::from_secs(1);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                state.acquire_slot(delay, Duration::ZERO).await;
                Instant::now()
            }));
        }

        let mut released = Vec::new();
        for handle in handles {
            released.push(handle.await.unwrap());
        }
        released.sort();

        for pair in released.windows(2) {
            assert!(pair[1] - pair[0] >= delay);
        }
    }

    #[tokio::test]
    async fn test_robots_initialized_once() {
        let state = Arc::new(DomainState::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let state = state.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                let entry = state
                    .robots_or_init(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        RobotsEntry::new(RobotsRuleset::conservative(), RobotsStatus::Denied)
                    })
                    .await;
                entry.status
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), RobotsStatus::Denied);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(state.robots().is_some());
    }

    #[test]
    fn test_registry_shares_state_per_domain() {
        let registry = DomainRegistry::new();
        assert!(registry.is_empty());

        let a = registry.get_or_create("https://example.com");
        let b = registry.get_or_create("https://example.com");
        let c = registry.get_or_create("https://other.org");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
        assert!(registry.get("https://missing.net").is_none());
    }
}
