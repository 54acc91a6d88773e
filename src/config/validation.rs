use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    MustBePositive { field: &'static str },

    #[error("{field} must be an http(s) URL, got '{value}'")]
    InvalidEndpoint { field: &'static str, value: String },

    #[error("provider.content_host must be a bare host name, got '{value}'")]
    InvalidContentHost { value: String },

    #[error("worker.retry.base_backoff_ms ({base}) exceeds max_backoff_ms ({max})")]
    BackoffOutOfOrder { base: u64, max: u64 },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_worker(config)?;
    validate_provider(config)?;
    Ok(())
}

fn validate_worker(config: &Config) -> Result<(), ValidationError> {
    let worker = &config.worker;

    if worker.concurrency == 0 {
        return Err(ValidationError::MustBePositive {
            field: "worker.concurrency",
        });
    }
    if worker.channel_size == 0 {
        return Err(ValidationError::MustBePositive {
            field: "worker.channel_size",
        });
    }
    if worker.retry.max_attempts == 0 {
        return Err(ValidationError::MustBePositive {
            field: "worker.retry.max_attempts",
        });
    }
    if worker.retry.base_backoff_ms > worker.retry.max_backoff_ms {
        return Err(ValidationError::BackoffOutOfOrder {
            base: worker.retry.base_backoff_ms,
            max: worker.retry.max_backoff_ms,
        });
    }

    Ok(())
}

fn validate_provider(config: &Config) -> Result<(), ValidationError> {
    let provider = &config.provider;

    validate_endpoint("provider.token_url", &provider.token_url)?;
    validate_endpoint("provider.api_base", &provider.api_base)?;

    let host = provider.content_host.as_str();
    if host.is_empty() || host.contains("://") || host.contains('/') {
        return Err(ValidationError::InvalidContentHost {
            value: host.to_string(),
        });
    }

    if provider.page_size == 0 {
        return Err(ValidationError::MustBePositive {
            field: "provider.page_size",
        });
    }
    if provider.request_timeout_secs == 0 {
        return Err(ValidationError::MustBePositive {
            field: "provider.request_timeout_secs",
        });
    }

    Ok(())
}

fn validate_endpoint(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidEndpoint {
            field,
            value: value.to_string(),
        })
    }
}
