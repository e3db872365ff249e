use crate::config::types::{Config, CrawlerConfig, IdentityConfig, SiteConfig, StoreConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for any configured delay: one hour
pub const MAX_DELAY_LIMIT_MS: u64 = 60 * 60 * 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_identity_config(&config.identity)?;
    validate_store_config(&config.store)?;
    validate_site_config(&config.site)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.per_category_cap < 1 {
        return Err(ConfigError::Validation(format!(
            "per_category_cap must be >= 1, got {}",
            config.per_category_cap
        )));
    }

    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.max_delay_ms > MAX_DELAY_LIMIT_MS {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms must be <= {}ms, got {}ms",
            MAX_DELAY_LIMIT_MS, config.max_delay_ms
        )));
    }

    if config.max_delay_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms ({}ms) must be >= base_delay_ms ({}ms)",
            config.max_delay_ms, config.base_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the identity pool
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents must contain at least one entry".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.connection.is_empty() {
        return Err(ConfigError::Validation(
            "store connection cannot be empty".to_string(),
        ));
    }

    if config.database.is_empty() {
        return Err(ConfigError::Validation(
            "store database cannot be empty".to_string(),
        ));
    }

    if config
        .database
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace())
    {
        return Err(ConfigError::Validation(format!(
            "store database must be a plain name, got '{}'",
            config.database
        )));
    }

    Ok(())
}

/// Validates the site layout
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.index_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid index_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "index_url must use HTTP(S), got '{}'",
            config.index_url
        )));
    }

    if !config.category_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "category_prefix must start with '/', got '{}'",
            config.category_prefix
        )));
    }

    if config.item_marker.is_empty() {
        return Err(ConfigError::Validation(
            "item_marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}
