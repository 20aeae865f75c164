//! Error types for the chestmem core library.

use thiserror::Error;

/// Top-level error type for all chestmem operations.
#[derive(Error, Debug)]
pub enum ChestmemError {
    /// A policy field held a value outside its allowed set.
    #[error("Unknown value for {field}: {value:?} (expected one of: {expected})")]
    Decode {
        /// Wire name of the offending field.
        field: &'static str,
        /// The rejected value, verbatim.
        value: String,
        /// Comma-separated list of accepted values.
        expected: String,
    },

    /// A short-form position string could not be parsed.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a [`WorldView`](crate::world::WorldView) when it
/// cannot answer a container query this tick.
///
/// The sweeper never propagates this; the entry is skipped and kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("World query failed at {position}: {reason}")]
pub struct OracleError {
    /// Position that was being queried.
    pub position: crate::Position,
    /// Host-provided description.
    pub reason: String,
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ChestmemError>;
