//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::variant::{Quality, VariantFormat, VariantSpec};

/// Root configuration for the image edge service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream origin the image identifiers resolve against.
    pub origin: OriginConfig,

    /// Parameters handed to the variant deriver.
    pub variant: VariantConfig,

    /// In-memory cache of fetched originals and derived variants.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Fixed routes proxied unmodified from the origin.
    pub passthrough: Vec<PassthroughRoute>,

    /// Serve the demo page at `/`.
    pub demo_page: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            origin: OriginConfig::default(),
            variant: VariantConfig::default(),
            cache: CacheConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            passthrough: vec![PassthroughRoute {
                path: "/icon2".to_string(),
                identifier: "icon2.jpg".to_string(),
            }],
            demo_page: true,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base location identifiers are resolved against (e.g., "https://cdn.example.com/images/").
    ///
    /// Overridden by the `IMAGE_URL` environment variable.
    pub base_url: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time allowed for one origin fetch in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787/".to_string(),
            connect_timeout_secs: 5,
            fetch_timeout_secs: 20,
        }
    }
}

/// Variant derivation parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VariantConfig {
    /// Target width in pixels.
    pub width: u32,

    /// Target output format tag ("webp", "jpeg", "png").
    pub format: VariantFormat,

    /// Target quality in `[0, 1]`.
    pub quality: f32,
}

impl Default for VariantConfig {
    fn default() -> Self {
        let spec = VariantSpec::default();
        Self {
            width: spec.width,
            format: spec.format,
            quality: spec.quality.get(),
        }
    }
}

impl VariantConfig {
    /// Convert into the deriver's parameter set.
    ///
    /// Quality outside `[0, 1]` is clamped; validation reports it first.
    pub fn to_spec(&self) -> VariantSpec {
        VariantSpec {
            width: self.width,
            format: self.format,
            quality: Quality::clamped(self.quality),
        }
    }
}

/// In-memory cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable caching.
    pub enabled: bool,

    /// Entry lifetime in seconds.
    pub ttl_secs: u64,

    /// Maximum number of entries per cache.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            max_entries: 256,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until response headers are produced, in seconds.
    ///
    /// Streaming bodies are not bounded by this timeout.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A fixed route that proxies one upstream resource unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PassthroughRoute {
    /// Request path (e.g., "/icon2").
    pub path: String,

    /// Identifier resolved against the origin base.
    pub identifier: String,
}
