//! End-to-end discovery and harvest tests

use crate::common::*;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use webmark::crawler::CrawlEngine;
use webmark::sitemap::SitemapResolver;
use webmark::{run_crawl, Coordinator, PageOutcome, Strategy, WebmarkError};
use wiremock::MockServer;

fn host_of(server: &MockServer) -> String {
    Url::parse(&server.uri())
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string()
}

#[tokio::test]
async fn test_sitemap_resolves_exact_urls() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();
    mount(&server, "/sitemap.xml", urlset(&base, &["/a", "/b"]), None).await;

    let fetcher = create_fetcher(&create_test_config(&server, output.path()));
    let urls = SitemapResolver::new(fetcher)
        .resolve(&Url::parse(&base).unwrap())
        .await;

    let urls: Vec<String> = urls.into_iter().map(String::from).collect();
    assert_eq!(urls, vec![format!("{}/a", base), format!("{}/b", base)]);
}

#[tokio::test]
async fn test_full_harvest_from_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount(&server, "/robots.txt", "User-agent: *\nAllow: /", None).await;
    mount(&server, "/sitemap.xml", urlset(&base, &["/a", "/b"]), None).await;
    mount(&server, "/a", article_page("Alpha", ""), Some(1)).await;
    mount(&server, "/b", article_page("Beta", ""), Some(1)).await;
    // The crawl engine must not run when the sitemap has entries
    mount(&server, "/", article_page("Home", ""), Some(0)).await;

    let config = create_test_config(&server, output.path());
    let stats = run_crawl(config, CancellationToken::new()).await.unwrap();

    assert_eq!(stats.strategy, Strategy::Sitemap);
    assert_eq!(stats.discovered, 2);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 0);

    let site_dir = output.path().join(host_of(&server));
    let alpha = std::fs::read_to_string(site_dir.join("a.md")).unwrap();
    assert!(alpha.starts_with("---\n"));
    assert!(alpha.contains(&format!("source_url: \"{}/a\"", base)));
    assert!(alpha.contains("# Alpha"));
    assert!(!alpha.contains("Home"), "navigation should be left out");
    assert!(site_dir.join("b.md").exists());
}

#[tokio::test]
async fn test_robots_sitemap_index_expanded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount(
        &server,
        "/robots.txt",
        format!("User-agent: *\nDisallow: /private/\nSitemap: {}/custom-index.xml", base),
        None,
    )
    .await;
    mount(
        &server,
        "/custom-index.xml",
        sitemap_index(&base, &["/posts.xml", "/pages.xml"]),
        None,
    )
    .await;
    mount(&server, "/posts.xml", urlset(&base, &["/p1", "/private/draft"]), None).await;
    mount(&server, "/pages.xml", urlset(&base, &["/about", "/p1"]), None).await;
    mount(&server, "/p1", article_page("Post", ""), Some(1)).await;
    mount(&server, "/about", article_page("About", ""), Some(1)).await;
    mount(&server, "/private/draft", article_page("Draft", ""), Some(0)).await;

    let config = create_test_config(&server, output.path());
    let stats = run_crawl(config, CancellationToken::new()).await.unwrap();

    assert_eq!(stats.strategy, Strategy::Sitemap);
    assert_eq!(stats.discovered, 3);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.count(PageOutcome::PermissionDenied), 1);
}

#[tokio::test]
async fn test_cyclic_sitemap_indexes_terminate() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount(&server, "/sitemap.xml", sitemap_index(&base, &["/other.xml"]), Some(1)).await;
    mount(
        &server,
        "/other.xml",
        sitemap_index(&base, &["/sitemap.xml", "/pages.xml"]),
        Some(1),
    )
    .await;
    mount(&server, "/pages.xml", urlset(&base, &["/page"]), Some(1)).await;

    let fetcher = create_fetcher(&create_test_config(&server, output.path()));
    let urls = SitemapResolver::new(fetcher)
        .resolve(&Url::parse(&base).unwrap())
        .await;

    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0].path(), "/page");
}

#[tokio::test]
async fn test_falls_back_to_crawl_without_sitemap() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &server,
        "/",
        article_page("Home", r#"<a href="/one">One</a><a href="/two">Two</a>"#),
        Some(1),
    )
    .await;
    mount(&server, "/one", article_page("One", ""), Some(1)).await;
    mount(&server, "/two", article_page("Two", ""), Some(1)).await;

    let config = create_test_config(&server, output.path());
    let stats = run_crawl(config, CancellationToken::new()).await.unwrap();

    assert_eq!(stats.strategy, Strategy::Crawl);
    assert_eq!(stats.discovered, 3);
    assert_eq!(stats.succeeded, 3);

    let site_dir = output.path().join(host_of(&server));
    assert!(site_dir.join("index.md").exists());
    assert!(site_dir.join("one.md").exists());
    assert!(site_dir.join("two.md").exists());
}

#[tokio::test]
async fn test_max_depth_zero_visits_only_seed() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(&server, "/", article_page("Home", r#"<a href="/one">One</a>"#), Some(1)).await;
    mount(&server, "/one", article_page("One", ""), Some(0)).await;

    let mut config = create_test_config(&server, output.path());
    config.crawler.max_depth = 0;

    let coordinator = Coordinator::new(config, CancellationToken::new()).unwrap();
    let discovery = coordinator.discover().await.unwrap();

    assert_eq!(discovery.strategy, Strategy::Crawl);
    assert_eq!(discovery.pages.len(), 1);
    assert_eq!(discovery.pages[0].url.path(), "/");
}

#[tokio::test]
async fn test_equivalent_urls_visited_once() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &server,
        "/",
        r##"<a href="/docs">Docs</a><a href="/docs#intro">Intro</a><a href="/docs?utm_source=feed">Feed</a><a href="./docs">Relative</a>"##,
        Some(1),
    )
    .await;
    mount(&server, "/docs", r#"<a href="/">Back</a>"#, Some(1)).await;

    let config = create_test_config(&server, output.path());
    let fetcher = create_fetcher(&config);
    let engine = CrawlEngine::new(
        fetcher,
        Url::parse(&server.uri()).unwrap(),
        3,
        CancellationToken::new(),
    );
    let pages = engine.crawl().await;

    let paths: Vec<&str> = pages.iter().map(|p| p.url.path()).collect();
    assert_eq!(paths, vec!["/", "/docs"]);
}

#[tokio::test]
async fn test_sitemap_only_reports_nothing_to_process() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount(&server, "/", article_page("Home", ""), Some(0)).await;

    let mut config = create_test_config(&server, output.path());
    config.crawler.sitemap_only = true;

    let result = run_crawl(config, CancellationToken::new()).await;
    assert!(matches!(result, Err(WebmarkError::NothingToProcess { .. })));
}

#[tokio::test]
async fn test_unreachable_site_reports_nothing_to_process() {
    let output = TempDir::new().unwrap();
    let mut config = webmark::Config::for_site("http://127.0.0.1:1");
    config.crawler.request_delay = 0.0;
    config.output.directory = output.path().to_string_lossy().into_owned();

    let result = run_crawl(config, CancellationToken::new()).await;
    assert!(matches!(result, Err(WebmarkError::NothingToProcess { .. })));
}
