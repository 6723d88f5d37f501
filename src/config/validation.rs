use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the base URL
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if config.base_url.is_empty() {
        return Err(ConfigError::Validation(
            "base_url is required".to_string(),
        ));
    }

    let url = Url::parse(&config.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", config.base_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Base URL '{}' must use the http or https scheme",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Base URL '{}' has no host",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_seconds("request_delay", config.request_delay)?;
    validate_seconds("max_backoff_delay", config.max_backoff_delay)?;

    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages must be between 1 and 100, got {}",
            config.max_concurrent_pages
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    Ok(())
}

fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    // Header values cannot carry line breaks
    if config.name.contains(['\r', '\n']) {
        return Err(ConfigError::Validation(format!(
            "user agent must be a single line, got '{}'",
            config.name.escape_debug()
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
