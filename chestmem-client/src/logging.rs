//! Log subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise both chestmem crates log at the
//! configured level.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

const FALLBACK_LEVEL: &str = "info";

/// Filter directives for `level`, falling back to `info` for unknown names.
#[must_use]
pub fn directives(level: &str) -> String {
    let level = match Level::from_str(level.trim()) {
        Ok(parsed) => parsed.as_str().to_ascii_lowercase(),
        Err(_) => FALLBACK_LEVEL.to_string(),
    };
    format!("chestmem_core={level},chestmem_client={level}")
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed (tests, or a host
/// that owns logging), in which case nothing changes.
pub fn init_tracing(level: &str, logging: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(logging.with_target);

    let installed = match logging.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Pretty => builder.try_init().is_ok(),
    };
    if installed {
        tracing::info!(log_level = level, format = ?logging.format, "Logging initialised");
    }
    installed
}
