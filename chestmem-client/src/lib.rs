//! # chestmem-client: host integration for chestmem
//!
//! This crate sits between a game client's callbacks and the
//! host-agnostic `chestmem-core` library.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Game client                │
//! │  ┌───────────────────────────────────┐  │
//! │  │       chestmem-client             │  │
//! │  │  ┌─────────────┐ ┌─────────────┐  │  │
//! │  │  │    Hooks    │ │   Session   │  │  │
//! │  │  └──────┬──────┘ └──────┬──────┘  │  │
//! │  │         │               │         │  │
//! │  │         ▼               ▼         │  │
//! │  │    ┌─────────────────────────┐    │  │
//! │  │    │     chestmem-core       │    │  │
//! │  │    └─────────────────────────┘    │  │
//! │  └───────────────────────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `session`: `ChestmemClient` and the per-world `Session`
//! - `events`: host events that can touch the memory bank
//! - `hooks`: constructors for those events from host callbacks
//! - `config`: `chestmem.toml` plus the `[logging]` section
//! - `logging`: `tracing-subscriber` setup

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod events;
pub mod hooks;
pub mod logging;
pub mod session;

pub use config::{ClientConfig, LogFormat, LoggingConfig};
pub use events::ClientEvent;
pub use session::{ChestmemClient, Session};
