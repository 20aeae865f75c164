//! # Chestmem Core Library
//!
//! Host-agnostic memory of container contents, kept honest by an amortized
//! integrity sweep.
//!
//! A [`MemoryBank`] maps each namespace (dimension) to the containers the
//! player has looked into. Memories go stale two ways, and the
//! [`IntegritySweeper`] catches both without ever stalling a tick:
//!
//! - **Expiry**: a memory outlives its configured [`MemoryLifetime`],
//!   measured on one of three clocks ([`LifetimeCountMode`]).
//! - **Invalidation**: the container is gone from the world, either
//!   broken by the player or found missing by a nearby periodic check.
//!
//! ## Performance Contract
//!
//! Each world tick does one unit of work: one namespace snapshot, or one
//! entry check. Cost per tick does not grow with the size of the bank.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod integrity;
pub mod memory;
pub mod metrics;
pub mod settings;
pub mod types;
pub mod world;

pub use config::ChestmemConfig;
pub use error::{ChestmemError, OracleError};
pub use integrity::{IntegritySweeper, RemovalReason, SweepState, SweepStep, Verdict};
pub use memory::{BankMetadata, FilteringSettings, Memory, MemoryBank, MemoryBuilder, StoredItem};
pub use settings::{IntegritySettings, Lifetime, LifetimeCountMode, MemoryLifetime};
pub use types::*;
pub use world::{FixedClock, SystemClock, WallClock, WorldView};
