//! Client-side configuration.
//!
//! The client reads the same `chestmem.toml` as the core and adds a
//! `[logging]` section on top of `chestmem_core::ChestmemConfig`:
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [logging]
//! format = "json"
//! with_target = false
//! ```

use chestmem_core::{ChestmemConfig, ChestmemError};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Include the module path of each event.
    #[serde(default = "default_true")]
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            with_target: true,
        }
    }
}

fn default_true() -> bool { true }

#[derive(Debug, Default, Deserialize)]
struct ClientSections {
    #[serde(default)]
    logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Everything the client needs at startup.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Core sections (`[general]`, `[integrity]`, `[filtering]`).
    pub core: ChestmemConfig,
    /// Logging setup.
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load from a TOML string.
    ///
    /// # Errors
    /// Returns `ChestmemError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> chestmem_core::error::Result<Self> {
        let core = ChestmemConfig::from_toml(toml_str)?;
        let sections: ClientSections =
            toml::from_str(toml_str).map_err(|e| ChestmemError::Config(e.to_string()))?;
        Ok(Self {
            core,
            logging: sections.logging,
        })
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> chestmem_core::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chestmem_core::MemoryLifetime;
    use std::io::Write;

    #[test]
    fn defaults_without_logging_section() {
        let config = ClientConfig::from_toml("[general]\nenabled = true\n").expect("parse");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.with_target);
    }

    #[test]
    fn both_layers_read_from_one_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "[general]\nlog_level = \"debug\"\n\n[integrity]\nmemoryLifetime = \"ONE_DAY\"\n\n[logging]\nformat = \"json\"\nwith_target = false"
        )
        .expect("write");

        let config = ClientConfig::from_file(file.path()).expect("load");
        assert_eq!(config.core.general.log_level, "debug");
        assert_eq!(config.core.integrity.memory_lifetime, MemoryLifetime::OneDay);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.logging.with_target);
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = ClientConfig::from_toml("[logging]\nformat = \"xml\"\n").expect_err("should fail");
        assert!(matches!(err, ChestmemError::Config(_)));
    }
}
