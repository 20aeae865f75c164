//! Container memories: what was in that chest.
//!
//! A [`Memory`] is a snapshot of one container's contents, stamped with the
//! three clocks at the moment it was recorded. Memories are immutable: a
//! newer look at the same container replaces the record outright.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{unknown_real_timestamp, UNKNOWN_LOADED_TIMESTAMP, UNKNOWN_WORLD_TIMESTAMP};

/// One stack of items seen in a container. Opaque to the integrity sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    /// Item identifier, e.g. `minecraft:diamond`.
    pub item: String,
    /// Stack size.
    pub count: u32,
}

impl StoredItem {
    /// Create a new item stack.
    #[must_use]
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }
}

/// A remembered container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    items: Vec<StoredItem>,
    #[serde(default = "unknown_loaded")]
    loaded_timestamp: i64,
    #[serde(default = "unknown_world")]
    in_game_timestamp: i64,
    #[serde(default = "unknown_real_timestamp")]
    real_timestamp: DateTime<Utc>,
}

fn unknown_loaded() -> i64 {
    UNKNOWN_LOADED_TIMESTAMP
}

fn unknown_world() -> i64 {
    UNKNOWN_WORLD_TIMESTAMP
}

impl Memory {
    /// Start building a memory from the observed contents.
    #[must_use]
    pub fn builder(items: Vec<StoredItem>) -> MemoryBuilder {
        MemoryBuilder::new(items)
    }

    /// Display name given to the container, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the container carries a display name.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Remembered contents.
    #[must_use]
    pub fn items(&self) -> &[StoredItem] {
        &self.items
    }

    /// Bank loaded-time (ticks) when recorded.
    #[must_use]
    pub fn loaded_timestamp(&self) -> i64 {
        self.loaded_timestamp
    }

    /// World time (ticks) when recorded.
    #[must_use]
    pub fn in_game_timestamp(&self) -> i64 {
        self.in_game_timestamp
    }

    /// Wall-clock instant when recorded.
    #[must_use]
    pub fn real_timestamp(&self) -> DateTime<Utc> {
        self.real_timestamp
    }
}

/// Collects a memory's contents before it is stamped with the clocks.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuilder {
    name: Option<String>,
    items: Vec<StoredItem>,
}

impl MemoryBuilder {
    /// Create a builder for the given contents.
    #[must_use]
    pub fn new(items: Vec<StoredItem>) -> Self {
        Self { name: None, items }
    }

    /// Attach a display name. Blank names are ignored.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() { None } else { Some(name) };
        self
    }

    /// Stamp with the current clock readings and produce the memory.
    #[must_use]
    pub fn build(self, loaded_time: i64, world_time: i64, real_time: DateTime<Utc>) -> Memory {
        Memory {
            name: self.name,
            items: self.items,
            loaded_timestamp: loaded_time,
            in_game_timestamp: world_time,
            real_timestamp: real_time,
        }
    }

    /// Produce a memory whose history is unknown (imported without
    /// timestamps). It counts as old under every clock.
    #[must_use]
    pub fn build_unknown(self) -> Memory {
        self.build(
            UNKNOWN_LOADED_TIMESTAMP,
            UNKNOWN_WORLD_TIMESTAMP,
            unknown_real_timestamp(),
        )
    }
}
