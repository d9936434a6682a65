use crate::config::Config;
use crate::ConfigError;

/// Validates a loaded configuration
///
/// The depth-ratio throttles only bound queue growth when they are greater
/// than one, and a zero worker ceiling would deadlock the scheduler, so both
/// are rejected here rather than at crawl time.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.site.host.is_empty() {
        return Err(ConfigError::Validation(
            "site.host must not be empty".to_string(),
        ));
    }

    if config.site.scheme != "http" && config.site.scheme != "https" {
        return Err(ConfigError::Validation(format!(
            "site.scheme must be http or https, got: {}",
            config.site.scheme
        )));
    }

    let base = format!("{}://{}/", config.site.scheme, config.site.host);
    if url::Url::parse(&base).is_err() {
        return Err(ConfigError::Validation(format!(
            "site.scheme and site.host do not form a valid URL: {}",
            base
        )));
    }

    if config.crawler.max_workers == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-workers must be at least 1".to_string(),
        ));
    }

    if config.crawler.listing_pages == 0 {
        return Err(ConfigError::Validation(
            "crawler.listing-pages must be at least 1".to_string(),
        ));
    }

    if config.crawler.listing_ratio <= 1 {
        return Err(ConfigError::Validation(
            "crawler.listing-ratio must be greater than 1".to_string(),
        ));
    }

    if config.crawler.namespace_ratio <= 1 {
        return Err(ConfigError::Validation(
            "crawler.namespace-ratio must be greater than 1".to_string(),
        ));
    }

    if config.crawler.rate_limit_base_ms == 0 {
        return Err(ConfigError::Validation(
            "crawler.rate-limit-base-ms must be greater than 0".to_string(),
        ));
    }

    if config.crawler.rate_limit_max_ms < config.crawler.rate_limit_base_ms {
        return Err(ConfigError::Validation(
            "crawler.rate-limit-max-ms must be at least rate-limit-base-ms".to_string(),
        ));
    }

    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "output.database-path must not be empty".to_string(),
        ));
    }

    Ok(())
}
