//! Integration hooks for the host's existing callbacks.
//!
//! These bridge the host's lifecycle, tick, block and screen callbacks to
//! [`ClientEvent`]s. Host adapters call them from wherever the host exposes
//! the underlying signal.

use chestmem_core::{MemoryBuilder, Namespace, Position, StoredItem};

use crate::events::ClientEvent;

/// The player joined a world. `label` identifies the save or server.
#[must_use]
pub fn on_join(label: impl Into<String>) -> ClientEvent {
    ClientEvent::Joined { label: label.into() }
}

/// The player left the world.
#[must_use]
pub fn on_disconnect() -> ClientEvent {
    ClientEvent::Disconnected
}

/// Start of a world tick.
#[must_use]
pub fn on_tick_start() -> ClientEvent {
    ClientEvent::TickStarted
}

/// End of a world tick.
#[must_use]
pub fn on_tick_end() -> ClientEvent {
    ClientEvent::TickEnded
}

/// The player destroyed the block at `position`.
#[must_use]
pub fn on_block_broken(position: Position) -> ClientEvent {
    ClientEvent::BlockBroken { position }
}

/// A container screen closed. `title` is the container's custom name, if
/// it has one; blank titles count as unnamed.
#[must_use]
pub fn on_container_closed(
    namespace: Namespace,
    position: Position,
    title: Option<&str>,
    items: Vec<StoredItem>,
) -> ClientEvent {
    let memory = MemoryBuilder::new(items);
    let memory = match title {
        Some(name) => memory.with_name(name),
        None => memory,
    };
    ClientEvent::ContainerClosed {
        namespace,
        position,
        memory,
    }
}
