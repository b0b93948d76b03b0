//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `origin.base_url`.
pub const IMAGE_URL_ENV: &str = "IMAGE_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a configuration file without validating it.
pub fn read_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply environment overrides on top of a parsed configuration.
fn apply_env_overrides(config: &mut ServiceConfig) {
    apply_image_url(config, std::env::var(IMAGE_URL_ENV).ok());
}

fn apply_image_url(config: &mut ServiceConfig, value: Option<String>) {
    if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
        tracing::debug!(base_url = %url, "origin.base_url overridden from {}", IMAGE_URL_ENV);
        config.origin.base_url = url;
    }
}

/// Command-line settings that win over both the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub origin_base_url: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(bind) = &self.bind_address {
            config.listener.bind_address = bind.clone();
        }
        if let Some(origin) = &self.origin_base_url {
            config.origin.base_url = origin.clone();
        }
    }
}

/// Where the running configuration comes from.
///
/// Resolution order: file (or defaults), then `IMAGE_URL`, then overrides,
/// then validation. Every reload resolves through the same source.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    path: Option<PathBuf>,
    overrides: ConfigOverrides,
}

impl ConfigSource {
    pub fn new(path: Option<PathBuf>, overrides: ConfigOverrides) -> Self {
        Self { path, overrides }
    }

    /// The watched file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn resolve(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.path {
            Some(path) => read_config(path)?,
            None => ServiceConfig::default(),
        };
        apply_env_overrides(&mut config);
        self.overrides.apply(&mut config);

        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }
}
