use crate::{UrlError, UrlResult};
use url::Url;

/// Path extensions of server-rendered pages whose query string selects content
const PAGE_EXTENSIONS: &[&str] = &[".html", ".htm", ".php", ".asp", ".aspx", ".jsp"];

/// Resolves `href` against `base` and reduces it to its canonical form
///
/// # Normalization Steps
///
/// 1. Resolve relative references against the base URL
/// 2. Remove the fragment (everything after #)
/// 3. Keep the query only on content-like paths: a page extension
///    (.html, .htm, .php, .asp, .aspx, .jsp) or a directory-like path
///    (empty or ending in `/`). Every other path loses its query.
///
/// Scheme, host and path are otherwise left as resolved, so two spellings
/// that differ only by fragment or by a stripped query map to one URL.
///
/// # Arguments
///
/// * `base` - The URL of the page the reference was found on
/// * `href` - The raw reference, absolute or relative
///
/// # Returns
///
/// * `Ok(Url)` - Normalized absolute URL
/// * `Err(UrlError)` - The reference cannot be resolved
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webmark::url::normalize_url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let url = normalize_url(&base, "/gallery?page=2#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/gallery");
/// ```
pub fn normalize_url(base: &Url, href: &str) -> UrlResult<Url> {
    let mut url = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    url.set_fragment(None);

    if url.query().is_some() && !is_content_like_path(url.path()) {
        url.set_query(None);
    }

    Ok(url)
}

/// Parses an absolute URL string and normalizes it
///
/// Used for seeds and sitemap entries, which are absolute already.
pub fn normalize_str(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_url(&url, "")
}

/// Returns true when query parameters on this path are considered meaningful
fn is_content_like_path(path: &str) -> bool {
    if path.is_empty() || path.ends_with('/') {
        return true;
    }

    PAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
