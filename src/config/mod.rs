//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, IMAGE_URL, then CLI overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via ArcSwap with request handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → ConfigSource resolves again (same overrides)
//!     → validation.rs validates
//!     → server rebuilds its state and swaps it atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{ConfigError, ConfigOverrides, ConfigSource, IMAGE_URL_ENV};
pub use schema::{
    CacheConfig, ListenerConfig, LogFormat, ObservabilityConfig, OriginConfig, PassthroughRoute,
    ServiceConfig, TimeoutConfig, VariantConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
