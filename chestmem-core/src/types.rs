//! Core type definitions for the chestmem store.
//!
//! Keys are `(Namespace, Position)` pairs; both are small, ordered and
//! serialisable so they can key JSON and TOML maps directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ChestmemError;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Ticks per second used for all lifetime arithmetic.
pub const TICKS_PER_SECOND: i64 = 20;

/// Loaded-time stamp given to memories whose session history is unknown.
pub const UNKNOWN_LOADED_TIMESTAMP: i64 = -437_822;

/// World-time stamp given to memories whose world history is unknown.
pub const UNKNOWN_WORLD_TIMESTAMP: i64 = -437_821;

/// Wall-clock stamp given to memories whose creation instant is unknown.
#[must_use]
pub fn unknown_real_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifier of one world or dimension the cache has observed,
/// e.g. `minecraft:overworld`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace from any string-like identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A block coordinate in the world.
///
/// Ordering is lexicographic on `(x, y, z)`, which fixes the visiting order
/// of a sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Squared euclidean distance to `other`, saturating at `i64::MAX`.
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for Position {
    type Err = ChestmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(ChestmemError::InvalidPosition(format!(
                "unknown number of coordinates: {}",
                parts.len()
            )));
        }
        let coord = |raw: &str| {
            raw.trim()
                .parse::<i32>()
                .map_err(|_| ChestmemError::InvalidPosition(format!("invalid integer in key: {s}")))
        };
        Ok(Self::new(coord(parts[0])?, coord(parts[1])?, coord(parts[2])?))
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Where the player currently is, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    /// Namespace the player is standing in.
    pub namespace: Namespace,
    /// Block position of the player.
    pub position: Position,
}
