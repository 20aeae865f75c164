//! Configuration for the container memory system.
//!
//! Maps directly to `chestmem.toml`. Policy sections seed every bank created
//! in a session; banks that carry their own metadata keep it.

use serde::{Deserialize, Serialize};

use crate::memory::{BankMetadata, FilteringSettings};
use crate::settings::IntegritySettings;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChestmemConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Default integrity policy for new banks.
    ///
    /// Unknown values fall back to their defaults with a warning instead of
    /// rejecting the whole file.
    #[serde(default, deserialize_with = "crate::settings::lenient")]
    pub integrity: IntegritySettings,
    /// Default provider filtering for new banks.
    #[serde(default)]
    pub filtering: FilteringSettings,
}

impl ChestmemConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ChestmemError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::ChestmemError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Metadata for a fresh bank, seeded from this configuration.
    #[must_use]
    pub fn bank_metadata(&self, name: Option<String>) -> BankMetadata {
        BankMetadata {
            name,
            integrity: self.integrity,
            filtering: self.filtering,
            ..BankMetadata::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether memories are recorded and swept at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: default_log_level(),
        }
    }
}

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
