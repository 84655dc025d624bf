use crate::config::types::{
    Config, DispatchConfig, DnsConfig, EndpointConfig, IdentityConfig, MirrorConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_dispatch_config(&config.dispatch)?;
    validate_identity_config(&config.identity)?;
    validate_mirror_config(&config.mirrors)?;
    validate_dns_config(&config.dns)?;
    validate_endpoint_config(&config.endpoints)?;
    Ok(())
}

/// Validates fan-out and pacing configuration
fn validate_dispatch_config(config: &DispatchConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 50 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 50, got {}",
            config.max_concurrent
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be > 0".to_string(),
        ));
    }

    if config.provider_timeout_secs < config.request_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "provider-timeout-secs ({}) must be >= request-timeout-secs ({})",
            config.provider_timeout_secs, config.request_timeout_secs
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must be <= max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates the browser identity pool
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user-agents must contain at least one entry".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agents cannot contain empty strings".to_string(),
        ));
    }

    Url::parse(&config.referer)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;

    Ok(())
}

fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    if config.nitter.is_empty() {
        return Err(ConfigError::Validation(
            "nitter mirror list cannot be empty".to_string(),
        ));
    }

    for mirror in &config.nitter {
        validate_base_url("nitter mirror", mirror)?;
    }

    Ok(())
}

fn validate_dns_config(config: &DnsConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "dns timeout-secs must be > 0".to_string(),
        ));
    }

    // Each label is prefixed to the target domain, so it must be a single label
    for label in &config.subdomains {
        if label.is_empty()
            || label.contains('.')
            || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "invalid subdomain label '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn validate_endpoint_config(config: &EndpointConfig) -> Result<(), ConfigError> {
    validate_base_url("geolocation endpoint", &config.geolocation)?;
    validate_base_url("reddit endpoint", &config.reddit)?;
    validate_base_url("instagram endpoint", &config.instagram)?;
    validate_base_url("youtube endpoint", &config.youtube)?;

    if config.whois_root.trim().is_empty() {
        return Err(ConfigError::Validation(
            "whois-root cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Base URLs must be absolute http(s) URLs
fn validate_base_url(what: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https, got {}",
            what, value, other
        ))),
    }
}
