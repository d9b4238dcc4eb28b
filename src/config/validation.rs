use crate::config::types::{Config, CrawlOptions, CrawlTargetConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_target(&config.crawl)?;
    validate_options(&config.options)?;
    Ok(())
}

/// Validates the crawl target section
fn validate_crawl_target(config: &CrawlTargetConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_path)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-path: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-path must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if base.host_str().is_none() {
        return Err(ConfigError::Validation(
            "base-path must contain a host".to_string(),
        ));
    }

    if config.source_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "source-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl options
fn validate_options(options: &CrawlOptions) -> Result<(), ConfigError> {
    if options.concurrency < 1 || options.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            options.concurrency
        )));
    }

    if options.include.is_empty() {
        return Err(ConfigError::Validation(
            "include must contain at least one seed path".to_string(),
        ));
    }

    for path in &options.include {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "include paths must start with '/', got '{}'",
                path
            )));
        }
    }

    for pattern in &options.exclude {
        Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }

    if let Some(viewport) = &options.viewport {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(ConfigError::Validation(format!(
                "viewport dimensions must be positive, got {}x{}",
                viewport.width, viewport.height
            )));
        }
    }

    Ok(())
}
