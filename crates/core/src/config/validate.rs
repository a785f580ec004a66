use std::time::Duration;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one video extension
/// - Plausible year range is ordered
/// - Catalog base URL and result limit
/// - Lookup concurrency, slow-response threshold and retry parameters
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let scan = &config.scan;
    if scan.video_extensions.iter().all(|e| e.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "scan.video_extensions cannot be empty".to_string(),
        ));
    }
    if let Some(max_year) = scan.max_year {
        if scan.min_year > max_year {
            return Err(ConfigError::ValidationError(format!(
                "scan.min_year ({}) is after scan.max_year ({})",
                scan.min_year, max_year
            )));
        }
    }

    if config.catalog.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.base_url cannot be empty".to_string(),
        ));
    }
    if config.catalog.limit == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.limit cannot be 0".to_string(),
        ));
    }

    let lookup = &config.lookup;
    if lookup.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "lookup.concurrency cannot be 0".to_string(),
        ));
    }
    if lookup.requests_per_minute == 0 {
        return Err(ConfigError::ValidationError(
            "lookup.requests_per_minute cannot be 0".to_string(),
        ));
    }
    if !lookup.slow_after_secs.is_finite()
        || lookup.slow_after_secs < 0.0
        || Duration::try_from_secs_f64(lookup.slow_after_secs).is_err()
    {
        return Err(ConfigError::ValidationError(format!(
            "lookup.slow_after_secs must be a finite number of seconds >= 0 (got {})",
            lookup.slow_after_secs
        )));
    }
    if !(lookup.retry.backoff_multiplier >= 1.0 && lookup.retry.backoff_multiplier.is_finite()) {
        return Err(ConfigError::ValidationError(
            "lookup.retry.backoff_multiplier must be >= 1.0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&lookup.retry.jitter) {
        return Err(ConfigError::ValidationError(
            "lookup.retry.jitter must be within 0.0..=1.0".to_string(),
        ));
    }

    Ok(())
}
