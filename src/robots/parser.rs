//! Robots.txt ruleset implementation
//!
//! This module wraps the robotstxt crate's matcher and adds the pieces it does
//! not expose: crawl delays and `Sitemap:` hints.

use robotstxt::DefaultMatcher;

/// Rules applied when robots.txt answers 403 under the conservative policy
const CONSERVATIVE_RULES: &str = "User-agent: *\n\
Allow: /$\n\
Allow: /index.html$\n\
Allow: /index.php$\n\
Allow: /sitemap.xml$\n\
Allow: /robots.txt$\n\
Disallow: /";

/// Parsed robots.txt rules for one domain
///
/// The raw content is kept and matched on demand, so the ruleset stays cheap
/// to clone and share between tasks.
#[derive(Debug, Clone)]
pub struct RobotsRuleset {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
    /// Sitemap URLs listed by the site, in file order
    sitemaps: Vec<String>,
}

impl RobotsRuleset {
    /// Creates a ruleset from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    ///
    /// # Returns
    ///
    /// A ruleset that can be used to check URL permissions
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
            sitemaps: parse_sitemaps(content),
        }
    }

    /// Creates a permissive ruleset that allows everything
    ///
    /// This is used when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
            sitemaps: Vec::new(),
        }
    }

    /// Creates the restrictive ruleset used for robots-denied domains
    ///
    /// Only `/`, `/index.html`, `/index.php`, `/sitemap.xml` and
    /// `/robots.txt` are allowed.
    pub fn conservative() -> Self {
        Self::from_content(CONSERVATIVE_RULES)
    }

    /// Replaces the sitemap hints of this ruleset
    pub fn with_sitemaps(mut self, sitemaps: Vec<String>) -> Self {
        self.sitemaps = sitemaps;
        self
    }

    /// Returns the sitemap URLs listed in robots.txt
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Returns true if the given URL is listed as a sitemap
    pub fn lists_sitemap(&self, url: &str) -> bool {
        self.sitemaps.iter().any(|s| s == url)
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - An absolute URL or a path (e.g., "/page.html")
    /// * `user_agent` - The full user agent string; only its product token
    ///   is matched against `User-agent:` groups
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent_token(user_agent), url)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        // Crawl-delay applies to the User-agent group it appears in
        let mut current_user_agents: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut crawl_delay_for_wildcard: Option<f64> = None;
        let mut crawl_delay_for_agent: Option<f64> = None;

        let normalized_agent = agent_token(user_agent).to_lowercase();

        for line in self.content.lines() {
            let trimmed = strip_comment(line);
            if trimmed.is_empty() {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A User-agent line after rules starts a new group
                    if in_rules {
                        current_user_agents.clear();
                        in_rules = false;
                    }
                    current_user_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if current_user_agents.iter().any(|ua| ua == "*") {
                        crawl_delay_for_wildcard = Some(delay);
                    }
                    if current_user_agents
                        .iter()
                        .any(|ua| ua != "*" && !ua.is_empty() && normalized_agent.starts_with(ua.as_str()))
                    {
                        crawl_delay_for_agent = Some(delay);
                    }
                }
                // Sitemap lines are global and do not close a group
                "sitemap" => {}
                _ => in_rules = true,
            }
        }

        // Prefer specific user-agent delay over wildcard delay
        crawl_delay_for_agent.or(crawl_delay_for_wildcard)
    }
}

/// Extracts the product token robots.txt groups are matched against
///
/// `"WebToMarkdown/1.0 (+https://example.com)"` matches `User-agent: WebToMarkdown`.
pub fn agent_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

fn strip_comment(line: &str) -> &str {
    match line.split_once('#') {
        Some((before, _)) => before.trim(),
        None => line.trim(),
    }
}

/// Collects `Sitemap:` directives, which apply to the whole file
fn parse_sitemaps(content: &str) -> Vec<String> {
    let mut sitemaps: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("sitemap") {
            continue;
        }
        let value = value.trim();
        if !value.is_empty() && !sitemaps.iter().any(|s| s == value) {
            sitemaps.push(value.to_string());
        }
    }

    sitemaps
}
