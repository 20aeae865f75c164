//! Integrity sweep: keeps remembered containers honest over time.
//!
//! Once per world tick the [`IntegritySweeper`] does exactly one unit of
//! work: it either snapshots the next namespace in rotation, or checks a
//! single entry of the current snapshot. Per-tick cost is therefore O(1) in
//! the size of the bank.
//!
//! ```text
//!            cooldown elapsed            snapshot non-empty
//!   ┌──────┐ ───────────────▶ ┌─────────┐ ─────────────────▶ ┌──────────┐
//!   │ Idle │                  │ Filling │                    │ Scanning │──┐ one entry
//!   └──────┘ ◀─────────────── └─────────┘                    └──────────┘◀─┘ per tick
//!       ▲      empty namespace                                    │
//!       └──────────── snapshot exhausted / namespace gone ────────┘
//! ```
//!
//! Each entry is checked in two stages:
//!
//! 1. **Expiry**: the memory's age on the configured clock is compared to
//!    the configured lifetime. Named memories may be exempt.
//! 2. **Validity**: if the entry is in the player's namespace, loaded and
//!    within 32 blocks, the world is asked whether a container is still
//!    there.
//!
//! Breaking a block is handled separately by
//! [`IntegritySweeper::on_player_break_block`], which removes immediately.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::memory::{Memory, MemoryBank};
use crate::metrics::IntegrityCounters;
use crate::settings::{IntegritySettings, LifetimeCountMode, Lifetime};
use crate::types::{Namespace, Position, TICKS_PER_SECOND};
use crate::world::{WallClock, WorldView};

/// World ticks to wait after a finished pass before snapshotting again.
pub const TICKS_BETWEEN_ENTRY_REFILL: i64 = 600;

/// Squared radius around the player inside which validity is checked.
pub const PERIODIC_CHECK_RANGE_SQUARED: i64 = 32 * 32;

const MILLIS_PER_TICK: i64 = 1000 / TICKS_PER_SECOND;

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// The three clock readings a memory's age can be measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReadings {
    /// Bank loaded-time counter (ticks).
    pub loaded_time: i64,
    /// World time (ticks).
    pub world_time: i64,
    /// Wall-clock instant.
    pub real_time: DateTime<Utc>,
}

/// Age of `memory` in milliseconds on the clock selected by `mode`.
#[must_use]
pub fn memory_age_millis(mode: LifetimeCountMode, memory: &Memory, clocks: &ClockReadings) -> i64 {
    match mode {
        LifetimeCountMode::RealTime => (clocks.real_time - memory.real_timestamp()).num_milliseconds(),
        LifetimeCountMode::WorldTime => clocks
            .world_time
            .saturating_sub(memory.in_game_timestamp())
            .saturating_mul(MILLIS_PER_TICK),
        LifetimeCountMode::LoadedTime => clocks
            .loaded_time
            .saturating_sub(memory.loaded_timestamp())
            .saturating_mul(MILLIS_PER_TICK),
    }
}

/// How many milliseconds past its lifetime `memory` is, or `None` when the
/// memory is exempt from expiry (lifetime `NEVER`, or named and preserved).
///
/// A result `>= 0` means the memory has expired.
#[must_use]
pub fn millis_past_expiry(
    settings: &IntegritySettings,
    memory: &Memory,
    clocks: &ClockReadings,
) -> Option<i64> {
    if settings.preserve_named && memory.is_named() {
        return None;
    }
    let Lifetime::Finite(seconds) = settings.memory_lifetime.span() else {
        return None;
    };
    let lifetime_ms = i64::try_from(seconds).unwrap_or(i64::MAX).saturating_mul(1000);
    Some(memory_age_millis(settings.lifetime_count_mode, memory, clocks).saturating_sub(lifetime_ms))
}

/// Whether `memory` has reached the end of its lifetime.
#[must_use]
pub fn is_expired(settings: &IntegritySettings, memory: &Memory, clocks: &ClockReadings) -> bool {
    millis_past_expiry(settings, memory, clocks).is_some_and(|past| past >= 0)
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a memory was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// Older than the configured lifetime.
    Expired,
    /// The world no longer has a container at that position.
    MissingContainer,
    /// The player broke the block.
    BlockBroken,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "Expiry"),
            Self::MissingContainer => write!(f, "Periodic Check"),
            Self::BlockBroken => write!(f, "Player Destroy Block"),
        }
    }
}

/// What happened to one checked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Passed every active check.
    Kept,
    /// Removed from the bank.
    Removed(RemovalReason),
    /// The world could not be queried; kept for now.
    Skipped,
    /// Failed a check, but the bank no longer held it (replaced or removed
    /// since the snapshot was taken).
    AlreadyGone,
}

/// What one call to [`IntegritySweeper::on_world_tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepStep {
    /// No bank is loaded; all sweep state was discarded.
    Reset,
    /// Nothing to do this tick (cooldown running, or no namespaces).
    Waiting,
    /// A snapshot of `entries` memories was taken from `namespace`.
    Filled {
        /// Namespace now being scanned.
        namespace: Namespace,
        /// Snapshot size.
        entries: usize,
    },
    /// The namespace whose turn it was had nothing to scan.
    EmptyNamespace(Namespace),
    /// One snapshot entry was evaluated.
    Checked {
        /// Entry position.
        position: Position,
        /// Outcome for that entry.
        verdict: Verdict,
        /// Whether this was the last entry of the pass.
        pass_complete: bool,
    },
    /// The scanned namespace disappeared; the rest of the snapshot was dropped.
    Abandoned(Namespace),
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Observable sweep state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    /// No active snapshot.
    Idle,
    /// Selecting and snapshotting the next namespace.
    ///
    /// A fill completes within the tick that starts it, so [`IntegritySweeper::state`]
    /// never reports this between calls.
    Filling,
    /// Working through a snapshot, one entry per tick.
    Scanning,
}

#[derive(Debug, Clone)]
struct ScanPass {
    namespace: Namespace,
    remaining: VecDeque<(Position, Memory)>,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Scanning(ScanPass),
}

/// Incremental, round-robin integrity checker for a [`MemoryBank`].
///
/// Holds only scan bookkeeping; the bank is passed in on every call.
#[derive(Debug, Clone)]
pub struct IntegritySweeper {
    phase: Phase,
    namespace_cursor: usize,
    last_check_completed: Option<i64>,
    counters: IntegrityCounters,
}

impl Default for IntegritySweeper {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegritySweeper {
    /// Create an idle sweeper that may start a pass immediately.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            namespace_cursor: 0,
            last_check_completed: None,
            counters: IntegrityCounters::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SweepState {
        match self.phase {
            Phase::Idle => SweepState::Idle,
            Phase::Scanning(_) => SweepState::Scanning,
        }
    }

    /// Namespace of the active snapshot, if scanning.
    #[must_use]
    pub fn current_namespace(&self) -> Option<&Namespace> {
        match &self.phase {
            Phase::Scanning(pass) => Some(&pass.namespace),
            Phase::Idle => None,
        }
    }

    /// Snapshot entries not yet checked.
    #[must_use]
    pub fn pending_entries(&self) -> usize {
        match &self.phase {
            Phase::Scanning(pass) => pass.remaining.len(),
            Phase::Idle => 0,
        }
    }

    /// World tick at which the last pass finished, if any.
    #[must_use]
    pub fn last_check_completed(&self) -> Option<i64> {
        self.last_check_completed
    }

    /// Running counters.
    #[must_use]
    pub fn counters(&self) -> &IntegrityCounters {
        &self.counters
    }

    /// Discard every piece of sweep state. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.namespace_cursor = 0;
        self.last_check_completed = None;
        self.counters = IntegrityCounters::new();
    }

    /// Drive the sweep by one world tick.
    ///
    /// Passing `None` for `bank` (no session loaded) resets the sweeper.
    pub fn on_world_tick<W, C>(&mut self, bank: Option<&mut MemoryBank>, world: &W, clock: &C) -> SweepStep
    where
        W: WorldView + ?Sized,
        C: WallClock + ?Sized,
    {
        let Some(bank) = bank else {
            self.reset();
            return SweepStep::Reset;
        };
        let world_time = world.world_time();

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Scanning(pass) => self.scan(pass, bank, world, clock, world_time),
            Phase::Idle => {
                if self.refill_due(world_time) {
                    self.fill(bank, world_time)
                } else {
                    SweepStep::Waiting
                }
            }
        }
    }

    /// Remove the memory at a block the player just destroyed.
    ///
    /// Ignores expiry and name preservation; gated only on
    /// `removeOnPlayerBlockBreak`. Returns the removed memory.
    pub fn on_player_break_block(
        &mut self,
        bank: Option<&mut MemoryBank>,
        player_namespace: Option<&Namespace>,
        position: Position,
    ) -> Option<Memory> {
        let bank = bank?;
        if !bank.integrity().remove_on_player_block_break {
            return None;
        }
        let namespace = player_namespace?;
        let removed = bank.remove_memory(namespace, position)?;
        self.counters.removed(RemovalReason::BlockBroken);
        debug!(%position, %namespace, reason = %RemovalReason::BlockBroken, "Removing memory");
        Some(removed)
    }

    fn refill_due(&self, world_time: i64) -> bool {
        self.last_check_completed
            .is_none_or(|last| world_time >= last.saturating_add(TICKS_BETWEEN_ENTRY_REFILL))
    }

    fn fill(&mut self, bank: &MemoryBank, world_time: i64) -> SweepStep {
        let count = bank.namespaces().len();
        if count == 0 {
            return SweepStep::Waiting;
        }
        if self.namespace_cursor >= count {
            self.namespace_cursor = 0;
        }
        let Some(namespace) = bank.namespaces().nth(self.namespace_cursor).cloned() else {
            return SweepStep::Waiting;
        };
        self.namespace_cursor += 1;

        let remaining: VecDeque<(Position, Memory)> = bank
            .memories(&namespace)
            .map(|entries| entries.iter().map(|(pos, mem)| (*pos, mem.clone())).collect())
            .unwrap_or_default();

        if remaining.is_empty() {
            return SweepStep::EmptyNamespace(namespace);
        }

        debug!(%namespace, tick = world_time, entries = remaining.len(), "Refreshing entry list");
        self.counters.pass_started();
        let entries = remaining.len();
        self.phase = Phase::Scanning(ScanPass {
            namespace: namespace.clone(),
            remaining,
        });
        SweepStep::Filled { namespace, entries }
    }

    fn scan<W, C>(
        &mut self,
        mut pass: ScanPass,
        bank: &mut MemoryBank,
        world: &W,
        clock: &C,
        world_time: i64,
    ) -> SweepStep
    where
        W: WorldView + ?Sized,
        C: WallClock + ?Sized,
    {
        if !bank.contains_namespace(&pass.namespace) {
            debug!(namespace = %pass.namespace, tick = world_time, "Namespace gone, abandoning pass");
            self.last_check_completed = Some(world_time);
            self.counters.pass_abandoned();
            return SweepStep::Abandoned(pass.namespace);
        }

        let Some((position, memory)) = pass.remaining.pop_front() else {
            self.last_check_completed = Some(world_time);
            self.counters.pass_completed();
            return SweepStep::Waiting;
        };

        self.counters.entry_checked();
        let clocks = ClockReadings {
            loaded_time: bank.loaded_time(),
            world_time,
            real_time: clock.now(),
        };
        let mut verdict = self.evaluate(&pass.namespace, position, &memory, bank.integrity(), &clocks, world);

        if let Verdict::Removed(reason) = verdict {
            if bank.remove_memory(&pass.namespace, position).is_some() {
                debug!(%position, namespace = %pass.namespace, %reason, "Removing memory");
                self.counters.removed(reason);
            } else {
                verdict = Verdict::AlreadyGone;
            }
        }

        let pass_complete = pass.remaining.is_empty();
        if pass_complete {
            debug!(namespace = %pass.namespace, tick = world_time, "Done checking");
            self.last_check_completed = Some(world_time);
            self.counters.pass_completed();
        } else {
            self.phase = Phase::Scanning(pass);
        }

        SweepStep::Checked {
            position,
            verdict,
            pass_complete,
        }
    }

    fn evaluate<W>(
        &mut self,
        namespace: &Namespace,
        position: Position,
        memory: &Memory,
        settings: &IntegritySettings,
        clocks: &ClockReadings,
        world: &W,
    ) -> Verdict
    where
        W: WorldView + ?Sized,
    {
        if let Some(past) = millis_past_expiry(settings, memory, clocks) {
            if past >= 0 {
                debug!(%position, %namespace, seconds_out_of_date = past / 1000, "Memory expired");
                return Verdict::Removed(RemovalReason::Expired);
            }
        }

        if !settings.check_periodically_for_missing_blocks {
            return Verdict::Kept;
        }
        let Some(player) = world.player() else {
            return Verdict::Kept;
        };
        if player.namespace != *namespace
            || !world.is_loaded(position)
            || position.distance_squared(&player.position) >= PERIODIC_CHECK_RANGE_SQUARED
        {
            return Verdict::Kept;
        }

        match world.is_still_valid_container(namespace, position) {
            Ok(true) => Verdict::Kept,
            Ok(false) => Verdict::Removed(RemovalReason::MissingContainer),
            Err(e) => {
                warn!(error = %e, %namespace, "Skipping validity check");
                self.counters.oracle_failed();
                Verdict::Skipped
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
