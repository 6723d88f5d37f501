//! robots.txt enforcement and request spacing against a live mock server

use crate::common::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use webmark::{FetchError, Robots403Policy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

#[tokio::test]
async fn test_robots_403_conservative_policy() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, output.path());
    config.crawler.robots_403_policy = Robots403Policy::Conservative;
    let fetcher = create_fetcher(&config);
    let gate = fetcher.gate();

    assert!(gate.can_fetch(&page_url(&server, "/")).await);
    assert!(gate.can_fetch(&page_url(&server, "/sitemap.xml")).await);
    assert!(!gate.can_fetch(&page_url(&server, "/private/page")).await);

    // Denied domains are also slowed down
    let delay = gate.effective_delay(&page_url(&server, "/")).await;
    assert_eq!(delay, Duration::from_secs(10));
}

#[tokio::test]
async fn test_robots_403_allow_policy() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let config = create_test_config(&server, output.path());
    let fetcher = create_fetcher(&config);

    assert!(fetcher.gate().can_fetch(&page_url(&server, "/private/page")).await);
}

#[tokio::test]
async fn test_sitemap_allowed_even_when_root_disallowed() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount(&server, "/robots.txt", "User-agent: *\nDisallow: /", None).await;

    let fetcher = create_fetcher(&create_test_config(&server, output.path()));
    let gate = fetcher.gate();

    assert!(gate.can_fetch(&page_url(&server, "/sitemap.xml")).await);
    assert!(gate.can_fetch(&page_url(&server, "/blog/sitemap.xml")).await);
    assert!(!gate.can_fetch(&page_url(&server, "/blog/post")).await);
}

#[tokio::test]
async fn test_disallowed_url_is_never_requested() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount(&server, "/robots.txt", "User-agent: *\nDisallow: /admin", None).await;
    mount(&server, "/admin/panel", "secret", Some(0)).await;

    let fetcher = create_fetcher(&create_test_config(&server, output.path()));
    let result = fetcher.get(&format!("{}/admin/panel", server.uri())).await;

    assert!(matches!(result, Err(FetchError::PermissionDenied { .. })));
}

#[tokio::test]
async fn test_robots_fetched_once_per_domain() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount(&server, "/robots.txt", "User-agent: *\nAllow: /", Some(1)).await;
    mount(&server, "/a", "a", Some(1)).await;
    mount(&server, "/b", "b", Some(1)).await;

    let fetcher = create_fetcher(&create_test_config(&server, output.path()));
    let (url_a, url_b) = (format!("{}/a", server.uri()), format!("{}/b", server.uri()));
    let (a, b) = tokio::join!(fetcher.get(&url_a), fetcher.get(&url_b));

    assert_eq!(a.unwrap(), "a");
    assert_eq!(b.unwrap(), "b");
}

#[tokio::test]
async fn test_concurrent_requests_to_one_domain_are_spaced() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount(&server, "/page", "ok", Some(3)).await;

    let mut config = create_test_config(&server, output.path());
    config.crawler.request_delay = 0.3;
    config.crawler.respect_robots = false;
    let fetcher = create_fetcher(&config);

    let url = format!("{}/page", server.uri());
    let started = Instant::now();
    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let fetcher = Arc::clone(&fetcher);
            let url = url.clone();
            tokio::spawn(async move { fetcher.get(&url).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), "ok");
    }

    // The first request goes out at once, the other two wait a delay each
    assert!(started.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_server_error_applies_backoff() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, output.path());
    config.crawler.request_delay = 0.25;
    config.crawler.max_backoff_delay = 3.0;
    config.crawler.respect_robots = false;
    let fetcher = create_fetcher(&config);

    let started = Instant::now();
    let result = fetcher.get(&format!("{}/flaky", server.uri())).await;

    assert!(matches!(result, Err(FetchError::Server { status: 503, .. })));
    // Backoff is min(2 * delay, max) scaled by at least 0.8
    assert!(started.elapsed() >= Duration::from_millis(400));
}
