//! Sitemap XML parsing
//!
//! Accepts `<urlset>` and `<sitemapindex>` documents; anything else,
//! including malformed XML, is treated as "not a sitemap".

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: the `<url><loc>` entries, normally content pages
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: the `<sitemap><loc>` entries, further sitemaps
    Index(Vec<String>),
}

impl SitemapDocument {
    /// Returns the `<loc>` values in document order
    pub fn locs(&self) -> &[String] {
        match self {
            Self::UrlSet(locs) | Self::Index(locs) => locs,
        }
    }

    pub fn into_locs(self) -> Vec<String> {
        match self {
            Self::UrlSet(locs) | Self::Index(locs) => locs,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

/// Parses sitemap XML
///
/// # Returns
///
/// * `Some(SitemapDocument)` - Well-formed XML with a `urlset` or `sitemapindex` root
/// * `None` - Anything else
pub fn parse_sitemap(xml: &str) -> Option<SitemapDocument> {
    let doc = match roxmltree::Document::parse_with_options(
        xml.trim_start_matches('\u{feff}').trim_start(),
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    ) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!("Not a sitemap, XML parsing error: {}", e);
            return None;
        }
    };
    let root = doc.root_element();

    match root.tag_name().name() {
        "sitemapindex" => Some(SitemapDocument::Index(child_locs(root, "sitemap"))),
        "urlset" => Some(SitemapDocument::UrlSet(child_locs(root, "url"))),
        other => {
            tracing::debug!("Not a sitemap, unexpected root element <{}>", other);
            None
        }
    }
}

/// Collects `<entry><loc>` text for every `entry` child of `root`
fn child_locs(root: roxmltree::Node<'_, '_>, entry: &str) -> Vec<String> {
    root.children()
        .filter(|n| n.is_element() && n.tag_name().name() == entry)
        .filter_map(|node| {
            node.children()
                .find(|n| n.is_element() && n.tag_name().name() == "loc")
                .and_then(|loc| loc.text())
                .map(str::trim)
                .filter(|loc| !loc.is_empty())
                .map(str::to_string)
        })
        .collect()
}
