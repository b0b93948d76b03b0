//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, quality within [0, 1])
//! - Check the origin base is an absolute http(s) URL
//! - Detect passthrough routes that shadow built-in routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;
use crate::origin::validate_identifier;

/// Largest variant width accepted.
pub const MAX_VARIANT_WIDTH: u32 = 4096;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("origin.base_url '{value}' is invalid: {reason}")]
    OriginUrl { value: String, reason: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("variant.width must be within 1..=4096, got {0}")]
    VariantWidth(u32),

    #[error("variant.quality must be within [0, 1], got {0}")]
    VariantQuality(f32),

    #[error("cache.{0} must be greater than zero when the cache is enabled")]
    CacheBound(&'static str),

    #[error("passthrough path '{0}' must start with '/' and not shadow a built-in route")]
    PassthroughPath(String),

    #[error("passthrough path '{0}' is declared more than once")]
    DuplicatePassthrough(String),

    #[error("passthrough identifier '{0}' is not a plain path segment")]
    PassthroughIdentifier(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Err(reason) = check_base_url(&config.origin.base_url) {
        errors.push(ValidationError::OriginUrl {
            value: config.origin.base_url.clone(),
            reason,
        });
    }

    if config.origin.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("origin.connect_timeout_secs"));
    }
    if config.origin.fetch_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("origin.fetch_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if config.variant.width == 0 || config.variant.width > MAX_VARIANT_WIDTH {
        errors.push(ValidationError::VariantWidth(config.variant.width));
    }
    if !(0.0..=1.0).contains(&config.variant.quality) {
        errors.push(ValidationError::VariantQuality(config.variant.quality));
    }

    if config.cache.enabled {
        if config.cache.ttl_secs == 0 {
            errors.push(ValidationError::CacheBound("ttl_secs"));
        }
        if config.cache.max_entries == 0 {
            errors.push(ValidationError::CacheBound("max_entries"));
        }
    }

    let mut seen = HashSet::new();
    for route in &config.passthrough {
        if !route.path.starts_with('/')
            || route.path == "/"
            || route.path == "/images"
            || route.path.starts_with("/images/")
        {
            errors.push(ValidationError::PassthroughPath(route.path.clone()));
        }
        if !seen.insert(route.path.as_str()) {
            errors.push(ValidationError::DuplicatePassthrough(route.path.clone()));
        }
        if validate_identifier(&route.identifier).is_err() {
            errors.push(ValidationError::PassthroughIdentifier(route.identifier.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}
