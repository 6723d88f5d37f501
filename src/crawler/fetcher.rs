//! HTTP fetcher implementation
//!
//! This module handles all page and sitemap requests, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Consulting the politeness gate before every request
//! - Courtesy backoff after server errors
//! - Error classification

use crate::config::Config;
use crate::crawler::politeness::PolitenessGate;
use crate::{FetchError, FetchResult};
use rand::Rng;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The run configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use webmark::config::Config;
/// use webmark::crawler::build_http_client;
///
/// let config = Config::for_site("https://example.com");
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.name.clone())
        .timeout(Duration::from_secs(config.crawler.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs robots- and rate-limited GET requests
///
/// Every request goes through the same steps: permission check, politeness
/// wait, then the request itself. Nothing is retried here; callers decide.
pub struct FetchClient {
    client: Client,
    gate: Arc<PolitenessGate>,
    request_delay: Duration,
    max_backoff_delay: Duration,
    cancel: CancellationToken,
}

impl FetchClient {
    pub fn new(
        client: Client,
        gate: Arc<PolitenessGate>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            gate,
            request_delay: config.crawler.request_delay(),
            max_backoff_delay: config.crawler.max_backoff_delay(),
            cancel,
        }
    }

    pub fn gate(&self) -> &Arc<PolitenessGate> {
        &self.gate
    }

    /// Fetches a URL and returns its body as text
    ///
    /// # Request Flow
    ///
    /// 1. Ask the politeness gate whether robots.txt allows the URL
    ///    - If not → `PermissionDenied`, no request is made
    /// 2. Wait for the domain's politeness delay
    /// 3. Send the GET request with the configured user agent
    ///
    /// # Error Handling
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Disallowed by robots.txt | Immediate → PermissionDenied |
    /// | HTTP 5xx | Backoff `min(delay * 2, max)` ±20% → Server |
    /// | Other non-2xx | Immediate → HttpStatus |
    /// | Timeout, DNS, connection refused | Immediate → Network |
    /// | Run cancelled | Immediate → Cancelled |
    pub async fn get(&self, url: &str) -> FetchResult<String> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        self.get_url(&parsed).await
    }

    /// Same as [`FetchClient::get`] for an already parsed URL
    pub async fn get_url(&self, url: &Url) -> FetchResult<String> {
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: url.to_string(),
            });
        }

        if !self.gate.can_fetch(url).await {
            return Err(FetchError::PermissionDenied {
                url: url.to_string(),
            });
        }

        self.gate.wait_if_needed(url).await?;

        tracing::debug!("GET {}", url);
        let request = self
            .client
            .get(url.clone())
            .header(USER_AGENT, self.gate.user_agent())
            .send();

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
            result = request => result.map_err(|e| network_error(url, &e))?,
        };

        let status = response.status();
        if status.is_server_error() {
            let backoff = self.backoff_delay();
            tracing::warn!(
                "Server error {} for {}, backing off for {:.2}s",
                status.as_u16(),
                url,
                backoff.as_secs_f64()
            );
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(backoff) => {}
            }
            return Err(FetchError::Server {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            tracing::warn!("HTTP {} for {}", status.as_u16(), url);
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| network_error(url, &e))
    }

    /// Courtesy delay after a 5xx: `min(delay * 2, max)` scaled by 0.8..1.2
    fn backoff_delay(&self) -> Duration {
        let base = (self.request_delay * 2).min(self.max_backoff_delay);
        base.mul_f64(rand::thread_rng().gen_range(0.8..1.2))
    }
}

fn network_error(url: &Url, error: &reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };

    tracing::warn!("Error requesting {}: {}", url, message);
    FetchError::Network {
        url: url.to_string(),
        message,
    }
}
