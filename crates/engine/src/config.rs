//! Engine configuration
//!
//! Loaded from TOML or built in code:
//!
//! ```toml
//! default_page_size = 6
//! transport_timeout_ms = 15000
//! change_channel_capacity = 256
//!
//! [page_sizes]
//! payroll_record = 12
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use pitlane_core::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Page size used by the dashboard listings
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Default bound on a single transport call
pub const DEFAULT_TRANSPORT_TIMEOUT_MS: u64 = 30_000;

/// Default capacity of each change channel
pub const DEFAULT_CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed into the config
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config value for '{field}': {message}")]
    Invalid {
        /// Offending key
        field: String,
        /// What is wrong with it
        message: String,
    },
}

/// Tunables of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size for kinds without an override
    pub default_page_size: usize,
    /// Per-kind page size overrides, keyed by snake_case kind name
    pub page_sizes: BTreeMap<String, usize>,
    /// Bound on each transport call in milliseconds; 0 disables it
    pub transport_timeout_ms: u64,
    /// Capacity of each per-kind change channel
    pub change_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            page_sizes: BTreeMap::new(),
            transport_timeout_ms: DEFAULT_TRANSPORT_TIMEOUT_MS,
            change_channel_capacity: DEFAULT_CHANGE_CHANNEL_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check every value is in range
    ///
    /// # Errors
    /// - `ConfigError::Invalid` for a zero page size or channel capacity, or
    ///   a `page_sizes` key that names no entity kind
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(invalid("default_page_size", "must be > 0"));
        }
        if self.change_channel_capacity == 0 {
            return Err(invalid("change_channel_capacity", "must be > 0"));
        }
        for (name, size) in &self.page_sizes {
            if name.parse::<EntityKind>().is_err() {
                return Err(invalid(
                    &format!("page_sizes.{}", name),
                    "unknown entity kind",
                ));
            }
            if *size == 0 {
                return Err(invalid(&format!("page_sizes.{}", name), "must be > 0"));
            }
        }
        Ok(())
    }

    /// Builder-style page size override
    pub fn with_page_size(mut self, kind: EntityKind, size: usize) -> Self {
        self.page_sizes.insert(kind.as_str().to_string(), size);
        self
    }

    /// Builder-style transport timeout
    pub fn with_transport_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.transport_timeout_ms = timeout.map_or(0, |t| t.as_millis() as u64);
        self
    }

    /// Page size used for `kind`
    pub fn page_size_for(&self, kind: EntityKind) -> usize {
        self.page_sizes
            .iter()
            .find(|(name, _)| name.parse::<EntityKind>().ok() == Some(kind))
            .map_or(self.default_page_size, |(_, size)| *size)
    }

    /// Transport timeout, `None` when disabled
    pub fn transport_timeout(&self) -> Option<Duration> {
        (self.transport_timeout_ms > 0).then(|| Duration::from_millis(self.transport_timeout_ms))
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
