//! Sweep counters.
//!
//! The sweeper runs on the host's tick thread only, so these are plain
//! integers owned by the [`IntegritySweeper`](crate::integrity::IntegritySweeper)
//! rather than atomics. Read them with [`IntegrityCounters::snapshot`].

use crate::integrity::RemovalReason;

/// Running totals for one session's sweeping.
#[derive(Debug, Clone, Default)]
pub struct IntegrityCounters {
    passes_started: u64,
    passes_completed: u64,
    passes_abandoned: u64,
    entries_checked: u64,
    removed_expired: u64,
    removed_missing: u64,
    removed_broken: u64,
    oracle_failures: u64,
}

impl IntegrityCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            passes_started: 0,
            passes_completed: 0,
            passes_abandoned: 0,
            entries_checked: 0,
            removed_expired: 0,
            removed_missing: 0,
            removed_broken: 0,
            oracle_failures: 0,
        }
    }

    pub(crate) fn pass_started(&mut self) {
        self.passes_started += 1;
    }

    pub(crate) fn pass_completed(&mut self) {
        self.passes_completed += 1;
    }

    pub(crate) fn pass_abandoned(&mut self) {
        self.passes_abandoned += 1;
    }

    pub(crate) fn entry_checked(&mut self) {
        self.entries_checked += 1;
    }

    pub(crate) fn oracle_failed(&mut self) {
        self.oracle_failures += 1;
    }

    pub(crate) fn removed(&mut self, reason: RemovalReason) {
        match reason {
            RemovalReason::Expired => self.removed_expired += 1,
            RemovalReason::MissingContainer => self.removed_missing += 1,
            RemovalReason::BlockBroken => self.removed_broken += 1,
        }
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            passes_started: self.passes_started,
            passes_completed: self.passes_completed,
            passes_abandoned: self.passes_abandoned,
            entries_checked: self.entries_checked,
            removed: [self.removed_expired, self.removed_missing, self.removed_broken],
            oracle_failures: self.oracle_failures,
        }
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Snapshots filled.
    pub passes_started: u64,
    /// Passes that reached the end of their snapshot.
    pub passes_completed: u64,
    /// Passes cut short because their namespace vanished.
    pub passes_abandoned: u64,
    /// Snapshot entries evaluated.
    pub entries_checked: u64,
    /// Removals by reason: [expired, missing container, block broken].
    pub removed: [u64; 3],
    /// World queries that failed and were skipped.
    pub oracle_failures: u64,
}

impl CounterSnapshot {
    /// Total memories removed for any reason.
    #[must_use]
    pub fn total_removed(&self) -> u64 {
        self.removed.iter().sum()
    }

    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP chestmem_sweep_passes_total Sweep passes by outcome\n\
             # TYPE chestmem_sweep_passes_total counter\n\
             chestmem_sweep_passes_total{{outcome=\"started\"}} {}\n\
             chestmem_sweep_passes_total{{outcome=\"completed\"}} {}\n\
             chestmem_sweep_passes_total{{outcome=\"abandoned\"}} {}\n\
             # HELP chestmem_entries_checked_total Snapshot entries evaluated\n\
             # TYPE chestmem_entries_checked_total counter\n\
             chestmem_entries_checked_total {}\n\
             # HELP chestmem_memories_removed_total Memories removed by reason\n\
             # TYPE chestmem_memories_removed_total counter\n\
             chestmem_memories_removed_total{{reason=\"expired\"}} {}\n\
             chestmem_memories_removed_total{{reason=\"missing_container\"}} {}\n\
             chestmem_memories_removed_total{{reason=\"block_broken\"}} {}\n\
             # HELP chestmem_oracle_failures_total World queries skipped after failure\n\
             # TYPE chestmem_oracle_failures_total counter\n\
             chestmem_oracle_failures_total {}\n",
            self.passes_started,
            self.passes_completed,
            self.passes_abandoned,
            self.entries_checked,
            self.removed[0],
            self.removed[1],
            self.removed[2],
            self.oracle_failures,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
