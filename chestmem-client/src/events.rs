//! Host events the client reacts to.
//!
//! Host adapters translate their own callbacks into [`ClientEvent`]s (see
//! [`hooks`](crate::hooks)) and feed them to
//! [`ChestmemClient::handle`](crate::session::ChestmemClient::handle) in the
//! order they happened.

use chestmem_core::{MemoryBuilder, Namespace, Position};

/// Something the host observed that may touch the memory bank.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The player joined a world or server.
    Joined {
        /// Label of the namespace set (save or server name).
        label: String,
    },

    /// The player left the world.
    Disconnected,

    /// A world tick is starting.
    TickStarted,

    /// A world tick has finished.
    TickEnded,

    /// The player destroyed a block.
    BlockBroken {
        /// Where the block was.
        position: Position,
    },

    /// The player closed a container screen after seeing its contents.
    ContainerClosed {
        /// Namespace the container lives in.
        namespace: Namespace,
        /// Container position.
        position: Position,
        /// Observed contents, not yet stamped with clock readings.
        memory: MemoryBuilder,
    },
}

impl ClientEvent {
    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Joined { .. } => "joined",
            Self::Disconnected => "disconnected",
            Self::TickStarted => "tick_started",
            Self::TickEnded => "tick_ended",
            Self::BlockBroken { .. } => "block_broken",
            Self::ContainerClosed { .. } => "container_closed",
        }
    }

    /// Whether this event comes once per tick.
    #[must_use]
    pub fn is_tick(&self) -> bool {
        matches!(self, Self::TickStarted | Self::TickEnded)
    }
}
