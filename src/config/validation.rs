use crate::config::types::{Config, ScanConfig, TransportConfig};
use crate::url::normalize_url;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scan_config(&config.scan)?;
    validate_transport_config(&config.transport)?;
    Ok(())
}

/// Validates scan configuration
fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 || config.worker_count > 100 {
        return Err(ConfigError::Validation(format!(
            "worker_count must be between 1 and 100, got {}",
            config.worker_count
        )));
    }

    if config.search_term.is_empty() {
        return Err(ConfigError::Validation(
            "search_term cannot be empty".to_string(),
        ));
    }

    if config.max_urls < 1 {
        return Err(ConfigError::Validation(format!(
            "max_urls must be >= 1, got {}",
            config.max_urls
        )));
    }

    // The starting URL must parse and survive normalization
    normalize_url(&config.starting_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid starting_url: {}", e)))?;

    Ok(())
}

/// Validates transport configuration
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    if config.request_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_ms must be >= 1".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}
