//! Property-Based Tests for chestmem core
//!
//! Uses `proptest` to check the sweep's invariants under random banks,
//! policies and clock readings.

use proptest::prelude::*;

use chrono::Utc;

use chestmem_core::integrity::{self, ClockReadings};
use chestmem_core::{
    FixedClock, IntegritySettings, IntegritySweeper, LifetimeCountMode, Memory, MemoryBank,
    MemoryLifetime, Namespace, OracleError, PlayerState, Position, SweepStep, WorldView,
};

struct EmptyWorld(i64);

impl WorldView for EmptyWorld {
    fn world_time(&self) -> i64 {
        self.0
    }

    fn player(&self) -> Option<PlayerState> {
        None
    }

    fn is_loaded(&self, _position: Position) -> bool {
        false
    }

    fn is_still_valid_container(&self, _: &Namespace, _: Position) -> Result<bool, OracleError> {
        Ok(false)
    }
}

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_position() -> impl Strategy<Value = Position> {
    (any::<i32>(), any::<i32>(), any::<i32>()).prop_map(|(x, y, z)| Position::new(x, y, z))
}

fn arb_lifetime() -> impl Strategy<Value = MemoryLifetime> {
    prop::sample::select(MemoryLifetime::ALL.to_vec())
}

fn arb_mode() -> impl Strategy<Value = LifetimeCountMode> {
    prop::sample::select(LifetimeCountMode::ALL.to_vec())
}

fn arb_bank() -> impl Strategy<Value = MemoryBank> {
    prop::collection::vec((0..4u8, -50..50i32, 0..800i64, any::<bool>()), 0..60).prop_map(|rows| {
        let mut bank = MemoryBank::new();
        bank.metadata_mut().integrity = IntegritySettings {
            memory_lifetime: MemoryLifetime::TenSeconds,
            ..IntegritySettings::default()
        };
        for (ns, x, loaded, named) in rows {
            let builder = Memory::builder(vec![]);
            let builder = if named { builder.with_name("Named") } else { builder };
            bank.add_memory(
                Namespace::new(format!("dim{ns}")),
                Position::new(x, 0, 0),
                builder.build(loaded, 0, Utc::now()),
            );
        }
        for _ in 0..1000 {
            bank.increment_loaded_time();
        }
        bank
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn position_text_round_trips(pos in arb_position()) {
        let text = pos.to_string();
        let back: Position = text.parse().map_err(|e| TestCaseError::fail(format!("{e}")))?;
        prop_assert_eq!(back, pos);
    }

    #[test]
    fn policy_wire_format_round_trips(
        lifetime in arb_lifetime(),
        mode in arb_mode(),
        flags in any::<(bool, bool, bool)>(),
    ) {
        let settings = IntegritySettings {
            remove_on_player_block_break: flags.0,
            check_periodically_for_missing_blocks: flags.1,
            memory_lifetime: lifetime,
            preserve_named: flags.2,
            lifetime_count_mode: mode,
        };
        let json = settings.to_json().map_err(|e| TestCaseError::fail(format!("{e}")))?;
        let back = IntegritySettings::from_json(&json).map_err(|e| TestCaseError::fail(format!("{e}")))?;
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn never_lifetime_never_expires(
        mode in arb_mode(),
        loaded_ts in any::<i64>(),
        now_loaded in any::<i64>(),
        now_world in any::<i64>(),
    ) {
        let settings = IntegritySettings {
            memory_lifetime: MemoryLifetime::Never,
            lifetime_count_mode: mode,
            preserve_named: false,
            ..IntegritySettings::default()
        };
        let mem = Memory::builder(vec![]).build(loaded_ts, loaded_ts, chrono::DateTime::<Utc>::UNIX_EPOCH);
        let clocks = ClockReadings { loaded_time: now_loaded, world_time: now_world, real_time: Utc::now() };
        prop_assert!(!integrity::is_expired(&settings, &mem, &clocks));
    }

    #[test]
    fn loaded_time_expiry_boundary(created in -1_000_000..1_000_000i64, elapsed in 0..400i64) {
        let settings = IntegritySettings {
            memory_lifetime: MemoryLifetime::TenSeconds,
            lifetime_count_mode: LifetimeCountMode::LoadedTime,
            ..IntegritySettings::default()
        };
        let mem = Memory::builder(vec![]).build(created, 0, Utc::now());
        let clocks = ClockReadings { loaded_time: created + elapsed, world_time: 0, real_time: Utc::now() };
        prop_assert_eq!(integrity::is_expired(&settings, &mem, &clocks), elapsed >= 200);
    }

    #[test]
    fn at_most_one_removal_per_tick(bank in arb_bank()) {
        let mut bank = bank;
        let mut sweeper = IntegritySweeper::new();
        let clock = FixedClock(Utc::now());
        let mut previous = bank.total_count();
        for tick in 0..3000 {
            let step = sweeper.on_world_tick(Some(&mut bank), &EmptyWorld(tick), &clock);
            let now = bank.total_count();
            prop_assert!(previous - now <= 1, "tick {} removed {}", tick, previous - now);
            if matches!(step, SweepStep::Filled { .. }) {
                prop_assert_eq!(previous, now);
            }
            previous = now;
        }
    }

    #[test]
    fn named_memories_survive_expiry(bank in arb_bank()) {
        let mut bank = bank;
        let named_before: usize = bank
            .namespaces()
            .filter_map(|ns| bank.memories(ns))
            .map(|m| m.values().filter(|mem| mem.is_named()).count())
            .sum();

        let mut sweeper = IntegritySweeper::new();
        let clock = FixedClock(Utc::now());
        for tick in 0..3000 {
            sweeper.on_world_tick(Some(&mut bank), &EmptyWorld(tick), &clock);
        }
        prop_assert_eq!(bank.total_count(), named_before);
    }
}
