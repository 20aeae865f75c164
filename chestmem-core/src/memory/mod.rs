//! The `MemoryBank` aggregate and its session metadata.
//!
//! A bank maps each [`Namespace`] to its own `Position → Memory` table.
//! It holds no sweep logic; the [`IntegritySweeper`](crate::integrity::IntegritySweeper)
//! drives removals from outside.

pub mod record;

pub use record::{Memory, MemoryBuilder, StoredItem};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChestmemError, Result};
use crate::settings::{self, IntegritySettings};
use crate::types::{Namespace, Position};

/// What the provider path is allowed to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilteringSettings {
    /// Only keep memories of containers that carry a display name.
    pub only_remember_named: bool,
}

/// Per-bank session metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankMetadata {
    /// User-facing bank name.
    #[serde(default)]
    pub name: Option<String>,
    /// When the bank was first created.
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    /// Ticks this bank has been loaded, across all sessions.
    #[serde(default)]
    pub loaded_time: i64,
    /// Integrity policy.
    #[serde(default, deserialize_with = "settings::lenient")]
    pub integrity: IntegritySettings,
    /// Provider filtering policy.
    #[serde(default)]
    pub filtering: FilteringSettings,
}

impl Default for BankMetadata {
    fn default() -> Self {
        Self {
            name: None,
            created: Utc::now(),
            loaded_time: 0,
            integrity: IntegritySettings::default(),
            filtering: FilteringSettings::default(),
        }
    }
}

/// All remembered containers for one save, partitioned by namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryBank {
    /// Session metadata and policy.
    #[serde(default)]
    metadata: BankMetadata,
    /// Namespace → position → memory.
    #[serde(default)]
    memories: BTreeMap<Namespace, BTreeMap<Position, Memory>>,
}

impl MemoryBank {
    /// Create a new empty memory bank with default metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bank with the given metadata.
    #[must_use]
    pub fn with_metadata(metadata: BankMetadata) -> Self {
        Self {
            metadata,
            memories: BTreeMap::new(),
        }
    }

    /// Session metadata.
    #[must_use]
    pub fn metadata(&self) -> &BankMetadata {
        &self.metadata
    }

    /// Mutable session metadata (settings edits).
    pub fn metadata_mut(&mut self) -> &mut BankMetadata {
        &mut self.metadata
    }

    /// Active integrity policy.
    #[must_use]
    pub fn integrity(&self) -> &IntegritySettings {
        &self.metadata.integrity
    }

    /// Ticks this bank has been loaded.
    #[must_use]
    pub fn loaded_time(&self) -> i64 {
        self.metadata.loaded_time
    }

    /// Advance the loaded-time counter by one tick.
    pub fn increment_loaded_time(&mut self) {
        self.metadata.loaded_time = self.metadata.loaded_time.saturating_add(1);
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Namespaces the bank currently holds, in sorted order.
    pub fn namespaces(&self) -> impl ExactSizeIterator<Item = &Namespace> {
        self.memories.keys()
    }

    /// Whether `namespace` still exists in the bank.
    #[must_use]
    pub fn contains_namespace(&self, namespace: &Namespace) -> bool {
        self.memories.contains_key(namespace)
    }

    /// All memories held for `namespace`.
    #[must_use]
    pub fn memories(&self, namespace: &Namespace) -> Option<&BTreeMap<Position, Memory>> {
        self.memories.get(namespace)
    }

    /// The memory at `(namespace, position)`, if any.
    #[must_use]
    pub fn get(&self, namespace: &Namespace, position: Position) -> Option<&Memory> {
        self.memories.get(namespace)?.get(&position)
    }

    /// Total number of memories across all namespaces.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.memories.values().map(BTreeMap::len).sum()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert or replace the memory at `(namespace, position)`.
    ///
    /// Returns the memory that was replaced, if any.
    pub fn add_memory(
        &mut self,
        namespace: Namespace,
        position: Position,
        memory: Memory,
    ) -> Option<Memory> {
        self.memories
            .entry(namespace)
            .or_default()
            .insert(position, memory)
    }

    /// Record a memory from the provider path, honouring the filtering
    /// policy. Returns `false` when the memory was filtered out.
    pub fn remember(&mut self, namespace: Namespace, position: Position, memory: Memory) -> bool {
        if self.metadata.filtering.only_remember_named && !memory.is_named() {
            debug!(%namespace, %position, "Ignoring unnamed memory");
            return false;
        }
        self.add_memory(namespace, position, memory);
        true
    }

    /// Remove the memory at `(namespace, position)`.
    ///
    /// The namespace itself is kept even when it becomes empty.
    pub fn remove_memory(&mut self, namespace: &Namespace, position: Position) -> Option<Memory> {
        self.memories.get_mut(namespace)?.remove(&position)
    }

    /// Drop a namespace and everything remembered in it.
    pub fn remove_namespace(&mut self, namespace: &Namespace) -> Option<BTreeMap<Position, Memory>> {
        self.memories.remove(namespace)
    }

    /// Forget everything, keeping metadata.
    pub fn clear(&mut self) {
        self.memories.clear();
    }

    // ------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------

    /// Encode the bank as JSON.
    ///
    /// # Errors
    /// Returns [`ChestmemError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ChestmemError::Serialization(e.to_string()))
    }

    /// Decode a bank from JSON.
    ///
    /// # Errors
    /// Returns [`ChestmemError::Serialization`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ChestmemError::Serialization(e.to_string()))
    }
}
