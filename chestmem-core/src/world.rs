//! Host-facing seams: what the core asks of the running game.
//!
//! The host implements [`WorldView`] over its live world and passes it in
//! on every tick; nothing here is stored between calls.

use chrono::{DateTime, Utc};

use crate::error::OracleError;
use crate::types::{Namespace, PlayerState, Position};

/// Read-only view of the live world for one tick.
pub trait WorldView {
    /// Current world time in ticks (persists with the save).
    fn world_time(&self) -> i64;

    /// The local player, if one is present.
    fn player(&self) -> Option<PlayerState>;

    /// Whether the chunk holding `position` is loaded and observable.
    fn is_loaded(&self, position: Position) -> bool;

    /// Whether `position` in `namespace` still hosts a container.
    ///
    /// # Errors
    /// Hosts that cannot answer right now return an [`OracleError`]; the
    /// caller keeps the memory.
    fn is_still_valid_container(
        &self,
        namespace: &Namespace,
        position: Position,
    ) -> Result<bool, OracleError>;
}

/// Source of wall-clock time.
pub trait WallClock {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// [`WallClock`] backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// [`WallClock`] pinned to a fixed instant. Useful for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl WallClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
