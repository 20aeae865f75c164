//! Session lifecycle: one loaded [`MemoryBank`] per joined world.
//!
//! [`ChestmemClient`] owns the optional [`Session`] and the
//! [`IntegritySweeper`]. The host drives it with plain method calls (or
//! [`ClientEvent`]s via [`ChestmemClient::handle`]):
//!
//! | Host signal           | Call                                   |
//! |-----------------------|----------------------------------------|
//! | join world            | [`ChestmemClient::on_join`]            |
//! | start of world tick   | [`ChestmemClient::start_world_tick`]   |
//! | end of world tick     | [`ChestmemClient::end_world_tick`]     |
//! | block destroyed       | [`ChestmemClient::on_player_break_block`] |
//! | container screen shut | [`ChestmemClient::on_container_closed`] |
//! | disconnect            | [`ChestmemClient::on_disconnect`]      |

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use chestmem_core::{
    ChestmemConfig, IntegritySweeper, Memory, MemoryBank, MemoryBuilder, Namespace, Position,
    SweepStep, SystemClock, WallClock, WorldView,
};

use crate::events::ClientEvent;

/// State that lives exactly as long as the player is in a world.
#[derive(Debug)]
pub struct Session {
    label: String,
    joined_at: DateTime<Utc>,
    bank: MemoryBank,
}

impl Session {
    /// Label of the namespace set (save or server name).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// When the session started.
    #[must_use]
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// The loaded bank.
    #[must_use]
    pub fn bank(&self) -> &MemoryBank {
        &self.bank
    }

    /// The loaded bank, mutably.
    pub fn bank_mut(&mut self) -> &mut MemoryBank {
        &mut self.bank
    }
}

/// Host-facing entry point.
#[derive(Debug)]
pub struct ChestmemClient<C: WallClock = SystemClock> {
    config: ChestmemConfig,
    clock: C,
    session: Option<Session>,
    sweeper: IntegritySweeper,
}

impl ChestmemClient<SystemClock> {
    /// Create a client on the system clock.
    #[must_use]
    pub fn new(config: ChestmemConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: WallClock> ChestmemClient<C> {
    /// Create a client reading wall-clock time from `clock`.
    #[must_use]
    pub fn with_clock(config: ChestmemConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            session: None,
            sweeper: IntegritySweeper::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ChestmemConfig {
        &self.config
    }

    /// The current session, if joined.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The loaded bank, if joined.
    #[must_use]
    pub fn bank(&self) -> Option<&MemoryBank> {
        self.session.as_ref().map(Session::bank)
    }

    /// The sweeper, for state and counters.
    #[must_use]
    pub fn sweeper(&self) -> &IntegritySweeper {
        &self.sweeper
    }

    /// Sweep counters in Prometheus text format, for a host that exposes them.
    #[must_use]
    pub fn metrics_text(&self) -> String {
        self.sweeper.counters().snapshot().to_prometheus()
    }

    fn enabled(&self) -> bool {
        self.config.general.enabled
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a session. `bank` is a previously saved bank for this label;
    /// `None` creates an empty one seeded from the configuration.
    ///
    /// Joining while already in a session replaces it; the old bank is
    /// returned so the host can save it.
    pub fn on_join(&mut self, label: impl Into<String>, bank: Option<MemoryBank>) -> Option<MemoryBank> {
        let label = label.into();
        let previous = self.on_disconnect();
        let bank = bank.unwrap_or_else(|| MemoryBank::with_metadata(self.config.bank_metadata(Some(label.clone()))));
        info!(
            %label,
            namespaces = bank.namespaces().len(),
            memories = bank.total_count(),
            "Joined; memory bank loaded"
        );
        self.session = Some(Session {
            label,
            joined_at: self.clock.now(),
            bank,
        });
        previous
    }

    /// End the session, discarding all sweep state. Returns the bank so the
    /// host can save it. Safe to call when not joined.
    pub fn on_disconnect(&mut self) -> Option<MemoryBank> {
        let counters = self.sweeper.counters().snapshot();
        self.sweeper.reset();
        let session = self.session.take()?;
        info!(
            label = %session.label,
            memories = session.bank.total_count(),
            removed = counters.total_removed(),
            entries_checked = counters.entries_checked,
            "Disconnected; memory bank unloaded"
        );
        Some(session.bank)
    }

    // ------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------

    /// Start of a world tick: advance the bank's loaded time.
    pub fn start_world_tick(&mut self) {
        if !self.enabled() {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.bank.increment_loaded_time();
        }
    }

    /// End of a world tick: run one sweep step.
    pub fn end_world_tick<W: WorldView + ?Sized>(&mut self, world: &W) -> SweepStep {
        if !self.enabled() {
            return SweepStep::Waiting;
        }
        let bank = self.session.as_mut().map(Session::bank_mut);
        self.sweeper.on_world_tick(bank, world, &self.clock)
    }

    // ------------------------------------------------------------------
    // World events
    // ------------------------------------------------------------------

    /// The player destroyed the block at `position`. Returns the forgotten
    /// memory, if there was one.
    pub fn on_player_break_block<W: WorldView + ?Sized>(&mut self, world: &W, position: Position) -> Option<Memory> {
        if !self.enabled() {
            return None;
        }
        let player = world.player();
        let bank = self.session.as_mut().map(Session::bank_mut);
        self.sweeper
            .on_player_break_block(bank, player.as_ref().map(|p| &p.namespace), position)
    }

    /// A container's contents were observed. Stamps `memory` with the
    /// current clocks and records it, subject to filtering. Returns `true`
    /// when it was stored.
    pub fn on_container_closed<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        namespace: Namespace,
        position: Position,
        memory: MemoryBuilder,
    ) -> bool {
        if !self.enabled() {
            return false;
        }
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            debug!(%namespace, %position, "No session, not remembering container");
            return false;
        };
        let memory = memory.build(session.bank.loaded_time(), world.world_time(), now);
        session.bank.remember(namespace, position, memory)
    }

    /// Dispatch one host event.
    pub fn handle<W: WorldView + ?Sized>(&mut self, event: ClientEvent, world: &W) {
        if !event.is_tick() {
            debug!(kind = event.kind(), "Handling client event");
        }
        match event {
            ClientEvent::Joined { label } => {
                self.on_join(label, None);
            }
            ClientEvent::Disconnected => {
                self.on_disconnect();
            }
            ClientEvent::TickStarted => self.start_world_tick(),
            ClientEvent::TickEnded => {
                self.end_world_tick(world);
            }
            ClientEvent::BlockBroken { position } => {
                self.on_player_break_block(world, position);
            }
            ClientEvent::ContainerClosed {
                namespace,
                position,
                memory,
            } => {
                self.on_container_closed(world, namespace, position, memory);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks;
    use chestmem_core::{
        FixedClock, IntegritySettings, MemoryLifetime, OracleError, PlayerState, StoredItem, SweepState,
    };

    struct Overworld {
        time: i64,
        player_at: Position,
    }

    impl WorldView for Overworld {
        fn world_time(&self) -> i64 {
            self.time
        }

        fn player(&self) -> Option<PlayerState> {
            Some(PlayerState {
                namespace: Namespace::new("minecraft:overworld"),
                position: self.player_at,
            })
        }

        fn is_loaded(&self, _position: Position) -> bool {
            true
        }

        fn is_still_valid_container(&self, _: &Namespace, _: Position) -> Result<bool, OracleError> {
            Ok(true)
        }
    }

    fn world() -> Overworld {
        Overworld {
            time: 6_000,
            player_at: Position::new(0, 64, 0),
        }
    }

    fn client(config: ChestmemConfig) -> ChestmemClient<FixedClock> {
        ChestmemClient::with_clock(config, FixedClock(Utc::now()))
    }

    fn overworld() -> Namespace {
        Namespace::new("minecraft:overworld")
    }

    fn items() -> MemoryBuilder {
        MemoryBuilder::new(vec![StoredItem::new("minecraft:bread", 5)])
    }

    #[test]
    fn join_seeds_bank_from_config() {
        let mut config = ChestmemConfig::default();
        config.integrity.memory_lifetime = MemoryLifetime::OneHour;
        let mut client = client(config);

        assert!(client.on_join("Survival", None).is_none());
        let bank = client.bank().expect("joined");
        assert_eq!(bank.integrity().memory_lifetime, MemoryLifetime::OneHour);
        assert_eq!(bank.metadata().name.as_deref(), Some("Survival"));
        assert_eq!(client.session().map(Session::label), Some("Survival"));
    }

    #[test]
    fn container_memories_are_stamped_with_all_clocks() {
        let mut client = client(ChestmemConfig::default());
        client.on_join("Survival", None);
        for _ in 0..3 {
            client.start_world_tick();
        }
        let world = world();
        assert!(client.on_container_closed(&world, overworld(), Position::new(1, 64, 1), items()));

        let mem = client
            .bank()
            .and_then(|b| b.get(&overworld(), Position::new(1, 64, 1)))
            .expect("remembered");
        assert_eq!(mem.loaded_timestamp(), 3);
        assert_eq!(mem.in_game_timestamp(), 6_000);
    }

    #[test]
    fn nothing_is_remembered_without_a_session() {
        let mut client = client(ChestmemConfig::default());
        assert!(!client.on_container_closed(&world(), overworld(), Position::new(1, 64, 1), items()));
        assert_eq!(client.end_world_tick(&world()), SweepStep::Reset);
        assert!(client.on_player_break_block(&world(), Position::new(1, 64, 1)).is_none());
    }

    #[test]
    fn break_block_uses_player_namespace() {
        let mut client = client(ChestmemConfig::default());
        client.on_join("Survival", None);
        let world = world();
        let pos = Position::new(2, 64, 2);
        client.on_container_closed(&world, overworld(), pos, items());
        client.on_container_closed(&world, Namespace::new("minecraft:the_nether"), pos, items());

        assert!(client.on_player_break_block(&world, pos).is_some());
        let bank = client.bank().expect("joined");
        assert!(bank.get(&overworld(), pos).is_none());
        assert!(bank.get(&Namespace::new("minecraft:the_nether"), pos).is_some());
    }

    #[test]
    fn disconnect_returns_bank_and_resets_sweeper() {
        let mut config = ChestmemConfig::default();
        config.integrity = IntegritySettings {
            memory_lifetime: MemoryLifetime::Never,
            ..IntegritySettings::default()
        };
        let mut client = client(config);
        client.on_join("Survival", None);
        let world = world();
        client.on_container_closed(&world, overworld(), Position::new(1, 64, 1), items());
        client.on_container_closed(&world, overworld(), Position::new(2, 64, 1), items());
        client.end_world_tick(&world);
        assert_eq!(client.sweeper().state(), SweepState::Scanning);

        let bank = client.on_disconnect().expect("had a session");
        assert_eq!(bank.total_count(), 2);
        assert!(client.session().is_none());
        assert_eq!(client.sweeper().state(), SweepState::Idle);
        assert!(client.on_disconnect().is_none());

        // Rejoining with the saved bank picks it back up.
        client.on_join("Survival", Some(bank));
        assert_eq!(client.bank().map(MemoryBank::total_count), Some(2));
    }

    #[test]
    fn metrics_text_reports_removals_until_disconnect() {
        let mut client = client(ChestmemConfig::default());
        client.on_join("Survival", None);
        let world = world();
        let pos = Position::new(2, 64, 2);
        client.on_container_closed(&world, overworld(), pos, items());
        assert!(client.on_player_break_block(&world, pos).is_some());

        let text = client.metrics_text();
        assert!(text.contains("chestmem_memories_removed_total{reason=\"block_broken\"} 1\n"));
        assert!(text.contains("chestmem_memories_removed_total{reason=\"expired\"} 0\n"));

        client.on_disconnect();
        assert!(client.metrics_text().contains("chestmem_memories_removed_total{reason=\"block_broken\"} 0\n"));
    }

    #[test]
    fn disabled_client_does_nothing() {
        let mut config = ChestmemConfig::default();
        config.general.enabled = false;
        let mut client = client(config);
        client.on_join("Survival", None);
        client.start_world_tick();
        assert!(!client.on_container_closed(&world(), overworld(), Position::new(0, 0, 0), items()));
        assert_eq!(client.end_world_tick(&world()), SweepStep::Waiting);
        assert_eq!(client.bank().map(MemoryBank::loaded_time), Some(0));
    }

    #[test]
    fn events_drive_a_full_session() {
        let mut config = ChestmemConfig::default();
        config.integrity.memory_lifetime = MemoryLifetime::TenSeconds;
        let mut client = client(config);
        let world = world();

        client.handle(hooks::on_join("Survival"), &world);
        client.handle(
            hooks::on_container_closed(overworld(), Position::new(5, 64, 5), None, vec![]),
            &world,
        );
        client.handle(
            hooks::on_container_closed(overworld(), Position::new(6, 64, 5), Some("Keep"), vec![]),
            &world,
        );

        for _ in 0..200 {
            client.handle(hooks::on_tick_start(), &world);
        }
        for _ in 0..3 {
            client.handle(hooks::on_tick_end(), &world);
        }

        let bank = client.bank().expect("joined");
        assert!(bank.get(&overworld(), Position::new(5, 64, 5)).is_none());
        assert!(bank.get(&overworld(), Position::new(6, 64, 5)).is_some());

        client.handle(hooks::on_block_broken(Position::new(6, 64, 5)), &world);
        assert_eq!(client.bank().map(MemoryBank::total_count), Some(0));

        client.handle(hooks::on_disconnect(), &world);
        assert!(client.session().is_none());
    }
}
