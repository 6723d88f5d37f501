use url::Url;

/// Returns the politeness key of a URL: its origin, `scheme://host[:port]`
///
/// Hosts are compared lowercase and default ports are omitted, so
/// `https://Example.com:443/a` and `https://example.com/b` share one key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webmark::url::domain_key;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(domain_key(&url), Some("https://example.com".to_string()));
/// ```
pub fn domain_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Returns the lowercase host of a URL
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs name the same host and explicit port
///
/// The scheme is not compared: `http://site/` and `https://site/` belong
/// to the same site. Default ports count as no port.
pub fn is_same_domain(base: &Url, url: &Url) -> bool {
    match (extract_domain(base), extract_domain(url)) {
        (Some(a), Some(b)) => a == b && base.port() == url.port(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_key_simple() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(domain_key(&url), Some("https://example.com".to_string()));
    }

    #[test]
    fn test_domain_key_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/page").unwrap();
        assert_eq!(domain_key(&url), Some("http://127.0.0.1:8080".to_string()));
    }

    #[test]
    fn test_domain_key_drops_default_port() {
        let url = Url::parse("https://example.com:443/page").unwrap();
        assert_eq!(domain_key(&url), Some("https://example.com".to_string()));
    }

    #[test]
    fn test_domain_key_without_host() {
        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert_eq!(domain_key(&url), None);
    }

    #[test]
    fn test_extract_domain_lowercases() {
        let url = Url::parse("https://Blog.Example.COM/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_same_domain() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(is_same_domain(&base, &Url::parse("https://example.com/a/b").unwrap()));
        assert!(is_same_domain(&base, &Url::parse("https://EXAMPLE.com/").unwrap()));
        assert!(!is_same_domain(&base, &Url::parse("https://blog.example.com/").unwrap()));
        assert!(!is_same_domain(&base, &Url::parse("https://example.com:8443/").unwrap()));
        assert!(!is_same_domain(&base, &Url::parse("https://other.org/").unwrap()));
    }

    #[test]
    fn test_same_domain_across_schemes() {
        let base = Url::parse("http://example.com/").unwrap();
        assert!(is_same_domain(&base, &Url::parse("https://example.com/about").unwrap()));
        assert!(is_same_domain(&base, &Url::parse("https://example.com:443/about").unwrap()));
        assert!(!is_same_domain(&base, &Url::parse("https://example.com:8443/about").unwrap()));
    }
}
