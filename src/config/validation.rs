use crate::config::types::{Config, CrawlerConfig, OutputConfig, ProxyConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_site_config(&config.site)?;
    if let Some(proxy) = &config.proxy {
        validate_proxy_config(proxy)?;
    }
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl bounds
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.queries.is_empty() {
        return Err(ConfigError::Validation(
            "at least one query is required".to_string(),
        ));
    }

    if let Some(blank) = config.queries.iter().position(|q| q.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "query #{} is empty",
            blank + 1
        )));
    }

    if config.pages < 1 {
        return Err(ConfigError::Validation(format!(
            "pages must be >= 1, got {}",
            config.pages
        )));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.detail_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "detail_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.listing_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "listing_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates storefront settings
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must be http or https, got '{}'",
            config.base_url
        )));
    }

    if config.sponsored_marker.is_empty() {
        return Err(ConfigError::Validation(
            "sponsored_marker cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.image_prefix)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid image_prefix: {}", e)))?;

    Ok(())
}

/// Validates proxy settings
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy endpoint: {}", e)))?;

    if endpoint.query().is_some() {
        return Err(ConfigError::Validation(
            "proxy endpoint must not carry a query string".to_string(),
        ));
    }

    if config.country.is_empty() || !config.country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Validation(format!(
            "proxy country must be a letter code, got '{}'",
            config.country
        )));
    }

    if config.api_key_env.is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.snapshot_directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "snapshot directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
