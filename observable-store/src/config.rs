//! Configuration for a `Store`
//!
//! The only tunable is the key-path separator. The config derives serde so
//! it can be embedded in a host application's own configuration file.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Character separating key-path segments
    /// Default: '.'
    pub separator: char,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { separator: '.' }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Reject separators that collide with ordinary key characters
    pub fn validate(&self) -> Result<()> {
        let c = self.separator;
        if c.is_alphanumeric() || c.is_whitespace() || c == '_' || c == '-' {
            return Err(StoreError::Configuration(format!(
                "separator {:?} would collide with key names",
                c
            )));
        }
        Ok(())
    }
}
