//! Configuration for the document store.

use crate::error::StoreError;
use crate::history::RetentionPolicy;
use serde::{Deserialize, Serialize};

/// Configuration shared by every document of a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How much accepted history each document keeps.
    pub retention: RetentionPolicy,
    /// Extension of the on-disk asset files (`document.<ext>`, `draft.<ext>`).
    pub file_extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention: RetentionPolicy::Unbounded,
            file_extension: "txt".to_string(),
        }
    }
}

impl StoreConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for store configuration.
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
        }
    }

    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.config.retention = retention;
        self
    }

    pub fn keep_last(mut self, operations: usize) -> Self {
        self.config.retention = RetentionPolicy::KeepLast(operations);
        self
    }

    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.file_extension = extension.into();
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}

impl Default for StoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
