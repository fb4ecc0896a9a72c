use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::reserve::ReserveConfig;

/// Errors from loading a ledger configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Ledger-wide settings.
///
/// ```toml
/// [reserves]
/// base = 1000000
/// increment = 200000
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub reserves: ReserveConfig,
}

impl LedgerConfig {
    /// Parse from TOML text. Missing sections fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserves.base.is_negative() {
            return Err(ConfigError::Invalid("reserves.base must not be negative".into()));
        }
        if self.reserves.increment.is_negative() {
            return Err(ConfigError::Invalid(
                "reserves.increment must not be negative".into(),
            ));
        }
        Ok(())
    }
}
