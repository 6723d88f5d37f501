use url::Url;

/// Path suffixes of files that are never pages
const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".zip", ".tar.gz",
    ".exe", ".dmg",
];

/// Returns true if the URL may hold a page worth fetching
///
/// Only http(s) URLs qualify, and paths ending in an image, document,
/// archive or executable extension are rejected (case-insensitively).
pub fn is_crawlable(url: &Url) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    let path = url.path().to_ascii_lowercase();
    !EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Returns true if a sitemap `<loc>` points at another sitemap
///
/// Heuristic: the URL ends in `.xml` or mentions "sitemap" anywhere. A page
/// whose slug contains "sitemap" is misclassified.
pub fn looks_like_sitemap(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.ends_with(".xml") || lower.contains("sitemap")
}
