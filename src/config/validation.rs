use super::models::{Config, parse_utc_offset};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid schedule.utc_offset '{0}', expected +HH:MM or -HH:MM")]
    InvalidUtcOffset(String),

    #[error("schedule.max_range_days must be between 1 and {limit}, got {actual}")]
    InvalidRangeLimit { actual: u32, limit: u32 },

    #[error("Invalid {field} '{value}', expected an http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("storage.max_upload_bytes must be positive")]
    InvalidUploadLimit,

    #[error("worker.stale_processing_after must be at least {min_secs}s")]
    StaleThresholdTooShort { min_secs: u64 },

    #[error("platform.request_timeout_secs must be positive")]
    InvalidRequestTimeout,
}

/// Longest range a single generation call may cover
const MAX_RANGE_DAYS_LIMIT: u32 = 366;

/// The reaper must never fire while a healthy item is still polling
/// (12 attempts x 3s plus the two other calls)
const MIN_STALE_SECS: u64 = 120;

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_schedule(config)?;
    validate_urls(config)?;
    validate_storage(config)?;
    validate_worker(config)?;
    validate_platform(config)?;
    Ok(())
}

fn validate_schedule(config: &Config) -> Result<(), ValidationError> {
    if parse_utc_offset(&config.schedule.utc_offset).is_none() {
        return Err(ValidationError::InvalidUtcOffset(
            config.schedule.utc_offset.clone(),
        ));
    }

    let days = config.schedule.max_range_days;
    if days == 0 || days > MAX_RANGE_DAYS_LIMIT {
        return Err(ValidationError::InvalidRangeLimit {
            actual: days,
            limit: MAX_RANGE_DAYS_LIMIT,
        });
    }

    Ok(())
}

fn validate_urls(config: &Config) -> Result<(), ValidationError> {
    let checks = [
        ("server.public_base_url", &config.server.public_base_url),
        ("platform.graph_url", &config.platform.graph_url),
    ];

    for (field, value) in checks {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            return Err(ValidationError::InvalidUrl {
                field,
                value: value.clone(),
            });
        }
    }

    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.max_upload_bytes.as_u64() == 0 {
        return Err(ValidationError::InvalidUploadLimit);
    }
    Ok(())
}

fn validate_worker(config: &Config) -> Result<(), ValidationError> {
    if config.worker.stale_processing_after.as_duration().as_secs() < MIN_STALE_SECS {
        return Err(ValidationError::StaleThresholdTooShort {
            min_secs: MIN_STALE_SECS,
        });
    }
    Ok(())
}

fn validate_platform(config: &Config) -> Result<(), ValidationError> {
    if config.platform.request_timeout_secs == 0 {
        return Err(ValidationError::InvalidRequestTimeout);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::{ByteSize, HumanDuration};

    #[test]
    fn test_valid_default_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_offset() {
        let mut config = Config::default();
        config.schedule.utc_offset = "UTC-3".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidUtcOffset(_))
        ));
    }

    #[test]
    fn test_range_limit_bounds() {
        let mut config = Config::default();
        config.schedule.max_range_days = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidRangeLimit { .. })
        ));

        config.schedule.max_range_days = 400;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidRangeLimit { .. })
        ));
    }

    #[test]
    fn test_public_base_url_must_be_http() {
        let mut config = Config::default();
        config.server.public_base_url = "studio.example.com".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidUrl {
                field: "server.public_base_url",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_upload_limit() {
        let mut config = Config::default();
        config.storage.max_upload_bytes = ByteSize(0);

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidUploadLimit)
        ));
    }

    #[test]
    fn test_stale_threshold_shorter_than_poll_ceiling() {
        let mut config = Config::default();
        config.worker.stale_processing_after = HumanDuration::from_secs(30);

        assert!(matches!(
            validate(&config),
            Err(ValidationError::StaleThresholdTooShort { .. })
        ));
    }
}
