//! Configuration for repositories and the storage backend.
//!
//! Configuration is plain serde data. Every field has a default, so an empty
//! JSON object is a valid configuration:
//!
//! ```
//! use model_registry_persistence::PersistenceConfig;
//!
//! let config = PersistenceConfig::from_json_str(r#"{
//!     "repository": { "default_page_size": 50, "request_timeout": "3s" }
//! }"#).unwrap();
//!
//! assert_eq!(config.repository.default_page_size, 50);
//! assert_eq!(config.repository.max_page_size, 1000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlite")]
use crate::backends::sqlite::SqliteBackendConfig;
use crate::error::{StorageResult, ValidationError};

/// Settings shared by every repository built from one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Page size used when a list request asks for zero or fewer items.
    #[serde(default = "default_page_size")]
    pub default_page_size: i32,

    /// Upper bound on the page size; larger requests are clamped.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i32,

    /// Deadline applied to requests whose context carries none.
    #[serde(default, with = "duration_opt")]
    pub request_timeout: Option<Duration>,
}

fn default_page_size() -> i32 {
    100
}

fn default_max_page_size() -> i32 {
    1000
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            request_timeout: None,
        }
    }
}

impl RepositoryConfig {
    /// Resolves the page size a list request will actually use.
    pub fn effective_page_size(&self, requested: i32) -> i32 {
        if requested <= 0 {
            self.default_page_size
        } else {
            requested.min(self.max_page_size)
        }
    }

    /// Checks that the page size bounds are usable.
    pub fn validate(&self) -> StorageResult<()> {
        if self.default_page_size <= 0 {
            return Err(invalid("default_page_size must be positive"));
        }
        if self.max_page_size < self.default_page_size {
            return Err(invalid("max_page_size must be at least default_page_size"));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(invalid("request_timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Top-level persistence configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Repository settings.
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// SQLite backend settings.
    #[cfg(feature = "sqlite")]
    #[serde(default)]
    pub sqlite: SqliteBackendConfig,
}

impl PersistenceConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> StorageResult<Self> {
        let config: PersistenceConfig = serde_json::from_str(json).map_err(|e| {
            ValidationError::InvalidConfig {
                message: e.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> StorageResult<()> {
        self.repository.validate()?;
        #[cfg(feature = "sqlite")]
        self.sqlite.validate()?;
        Ok(())
    }
}

pub(crate) fn invalid(message: impl Into<String>) -> crate::error::StorageError {
    ValidationError::InvalidConfig {
        message: message.into(),
    }
    .into()
}

/// Serde adapter for optional human-readable durations such as `"250ms"`.
mod duration_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_str(&humantime::format_duration(*d).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| humantime::parse_duration(&s).map_err(D::Error::custom))
            .transpose()
    }
}
