use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use webmark::config::Config;
use webmark::crawler::{build_http_client, FetchClient, PolitenessGate};
use webmark::DomainRegistry;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for the mock server with no request spacing
pub fn create_test_config(server: &MockServer, output_dir: &std::path::Path) -> Config {
    let mut config = Config::for_site(server.uri());
    config.crawler.request_delay = 0.0;
    config.user_agent.name = "TestBot/1.0".to_string();
    config.output.directory = output_dir.to_string_lossy().into_owned();
    config
}

/// Builds a fetch client and its politeness gate from a configuration
pub fn create_fetcher(config: &Config) -> Arc<FetchClient> {
    let client = build_http_client(config).expect("Failed to build HTTP client");
    let cancel = CancellationToken::new();
    let gate = Arc::new(PolitenessGate::new(
        client.clone(),
        config,
        Arc::new(DomainRegistry::new()),
        cancel.clone(),
    ));
    Arc::new(FetchClient::new(client, gate, config, cancel))
}

/// Mounts a 200 response; `hits` makes the server verify the request count
pub async fn mount(server: &MockServer, p: &str, body: impl Into<String>, hits: Option<u64>) {
    let mock = Mock::given(method("GET")).and(path(p)).respond_with(
        ResponseTemplate::new(200)
            .set_body_string(body.into())
            .insert_header("content-type", "text/html"),
    );
    match hits {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

pub fn urlset(base: &str, paths: &[&str]) -> String {
    let entries: String = paths
        .iter()
        .map(|p| format!("<url><loc>{}{}</loc></url>", base, p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

pub fn sitemap_index(base: &str, paths: &[&str]) -> String {
    let entries: String = paths
        .iter()
        .map(|p| format!("<sitemap><loc>{}{}</loc></sitemap>", base, p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

/// A page with enough article text to be extracted
pub fn article_page(title: &str, extra: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <nav><a href="/">Home</a></nav>
        <article><h1>{title}</h1><p>The {title} page has enough prose in it that the extractor picks the article element as its main content.</p></article>
        {extra}
        </body></html>"#
    )
}
