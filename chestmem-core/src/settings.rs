//! Integrity policy: which expiry and validity behaviours are active.
//!
//! The wire format is a flat object with camelCase keys, every key
//! optional:
//!
//! ```json
//! {
//!   "removeOnPlayerBlockBreak": true,
//!   "checkPeriodicallyForMissingBlocks": true,
//!   "memoryLifetime": "TWELVE_HOURS",
//!   "preserveNamed": true,
//!   "lifetimeCountMode": "LOADED_TIME"
//! }
//! ```
//!
//! Two decode policies exist. [`IntegritySettings`]'s `Deserialize` impl is
//! strict: an unknown enum name fails the whole decode. [`lenient`] (used by
//! the config loader and bank metadata) substitutes the field default and
//! logs a warning instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::{ChestmemError, Result};

// ---------------------------------------------------------------------------
// Wire-named enums
// ---------------------------------------------------------------------------

/// Enums whose variants travel as fixed upper-case names.
trait WireEnum: Sized + Copy + 'static {
    /// Wire key of the field holding this enum.
    const FIELD: &'static str;
    /// Every variant, in ladder order.
    const VARIANTS: &'static [Self];

    fn wire_name(self) -> &'static str;

    fn parse_wire(value: &str) -> Result<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| v.wire_name() == value)
            .ok_or_else(|| ChestmemError::Decode {
                field: Self::FIELD,
                value: value.to_string(),
                expected: Self::VARIANTS
                    .iter()
                    .map(|v| v.wire_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Expiry span of a memory: a fixed number of seconds, or never.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Expire once the memory is this many seconds old.
    Finite(u64),
    /// Never expire.
    Infinite,
}

/// The selectable lifetime ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryLifetime {
    /// 10 seconds.
    TenSeconds,
    /// 5 minutes.
    FiveMinutes,
    /// 20 minutes.
    TwentyMinutes,
    /// 40 minutes.
    FortyMinutes,
    /// 1 hour.
    OneHour,
    /// 2 hours.
    TwoHours,
    /// 4 hours.
    FourHours,
    /// 6 hours.
    SixHours,
    /// 12 hours.
    #[default]
    TwelveHours,
    /// 1 day.
    OneDay,
    /// 2 days.
    TwoDays,
    /// 5 days.
    FiveDays,
    /// 7 days.
    SevenDays,
    /// Expiry disabled.
    Never,
}

impl MemoryLifetime {
    /// Every ladder entry, shortest first, `Never` last.
    pub const ALL: [Self; 14] = [
        Self::TenSeconds,
        Self::FiveMinutes,
        Self::TwentyMinutes,
        Self::FortyMinutes,
        Self::OneHour,
        Self::TwoHours,
        Self::FourHours,
        Self::SixHours,
        Self::TwelveHours,
        Self::OneDay,
        Self::TwoDays,
        Self::FiveDays,
        Self::SevenDays,
        Self::Never,
    ];

    /// Tagged expiry span for this entry.
    #[must_use]
    pub fn span(self) -> Lifetime {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;
        const DAY: u64 = 24 * HOUR;
        match self {
            Self::TenSeconds => Lifetime::Finite(10),
            Self::FiveMinutes => Lifetime::Finite(5 * MINUTE),
            Self::TwentyMinutes => Lifetime::Finite(20 * MINUTE),
            Self::FortyMinutes => Lifetime::Finite(40 * MINUTE),
            Self::OneHour => Lifetime::Finite(HOUR),
            Self::TwoHours => Lifetime::Finite(2 * HOUR),
            Self::FourHours => Lifetime::Finite(4 * HOUR),
            Self::SixHours => Lifetime::Finite(6 * HOUR),
            Self::TwelveHours => Lifetime::Finite(12 * HOUR),
            Self::OneDay => Lifetime::Finite(DAY),
            Self::TwoDays => Lifetime::Finite(2 * DAY),
            Self::FiveDays => Lifetime::Finite(5 * DAY),
            Self::SevenDays => Lifetime::Finite(7 * DAY),
            Self::Never => Lifetime::Infinite,
        }
    }

    /// Lifetime in seconds, or `None` for [`MemoryLifetime::Never`].
    #[must_use]
    pub fn seconds(self) -> Option<u64> {
        match self.span() {
            Lifetime::Finite(secs) => Some(secs),
            Lifetime::Infinite => None,
        }
    }
}

impl WireEnum for MemoryLifetime {
    const FIELD: &'static str = "memoryLifetime";
    const VARIANTS: &'static [Self] = &Self::ALL;

    fn wire_name(self) -> &'static str {
        match self {
            Self::TenSeconds => "TEN_SECONDS",
            Self::FiveMinutes => "FIVE_MINUTES",
            Self::TwentyMinutes => "TWENTY_MINUTES",
            Self::FortyMinutes => "FORTY_MINUTES",
            Self::OneHour => "ONE_HOUR",
            Self::TwoHours => "TWO_HOURS",
            Self::FourHours => "FOUR_HOURS",
            Self::SixHours => "SIX_HOURS",
            Self::TwelveHours => "TWELVE_HOURS",
            Self::OneDay => "ONE_DAY",
            Self::TwoDays => "TWO_DAYS",
            Self::FiveDays => "FIVE_DAYS",
            Self::SevenDays => "SEVEN_DAYS",
            Self::Never => "NEVER",
        }
    }
}

/// Which clock a memory's age is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifetimeCountMode {
    /// Wall-clock time since creation.
    RealTime,
    /// World ticks since creation (survives across sessions of the save).
    WorldTime,
    /// Ticks the bank has been loaded since creation.
    #[default]
    LoadedTime,
}

impl LifetimeCountMode {
    /// Every mode.
    pub const ALL: [Self; 3] = [Self::RealTime, Self::WorldTime, Self::LoadedTime];
}

impl WireEnum for LifetimeCountMode {
    const FIELD: &'static str = "lifetimeCountMode";
    const VARIANTS: &'static [Self] = &Self::ALL;

    fn wire_name(self) -> &'static str {
        match self {
            Self::RealTime => "REAL_TIME",
            Self::WorldTime => "WORLD_TIME",
            Self::LoadedTime => "LOADED_TIME",
        }
    }
}

macro_rules! wire_enum_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.wire_name())
            }
        }

        impl FromStr for $ty {
            type Err = ChestmemError;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_wire(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.wire_name())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse_wire(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_enum_impls!(MemoryLifetime);
wire_enum_impls!(LifetimeCountMode);

// ---------------------------------------------------------------------------
// IntegritySettings
// ---------------------------------------------------------------------------

/// Integrity policy consumed by the sweeper and the block-break path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawIntegritySettings")]
pub struct IntegritySettings {
    /// Remove the memory at a block the player breaks.
    pub remove_on_player_block_break: bool,
    /// Periodically confirm nearby memories still sit on a container.
    pub check_periodically_for_missing_blocks: bool,
    /// How long an unprotected memory lives.
    pub memory_lifetime: MemoryLifetime,
    /// Exempt named memories from lifetime expiry.
    pub preserve_named: bool,
    /// Clock used to age memories.
    pub lifetime_count_mode: LifetimeCountMode,
}

impl Default for IntegritySettings {
    fn default() -> Self {
        Self {
            remove_on_player_block_break: true,
            check_periodically_for_missing_blocks: true,
            memory_lifetime: MemoryLifetime::TwelveHours,
            preserve_named: true,
            lifetime_count_mode: LifetimeCountMode::LoadedTime,
        }
    }
}

/// Wire-format view of [`IntegritySettings`] before enum names are checked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIntegritySettings {
    /// `removeOnPlayerBlockBreak`.
    pub remove_on_player_block_break: Option<bool>,
    /// `checkPeriodicallyForMissingBlocks`.
    pub check_periodically_for_missing_blocks: Option<bool>,
    /// `memoryLifetime`, unvalidated.
    pub memory_lifetime: Option<String>,
    /// `preserveNamed`.
    pub preserve_named: Option<bool>,
    /// `lifetimeCountMode`, unvalidated.
    pub lifetime_count_mode: Option<String>,
}

impl TryFrom<RawIntegritySettings> for IntegritySettings {
    type Error = ChestmemError;

    fn try_from(raw: RawIntegritySettings) -> Result<Self> {
        let def = Self::default();
        Ok(Self {
            remove_on_player_block_break: raw
                .remove_on_player_block_break
                .unwrap_or(def.remove_on_player_block_break),
            check_periodically_for_missing_blocks: raw
                .check_periodically_for_missing_blocks
                .unwrap_or(def.check_periodically_for_missing_blocks),
            memory_lifetime: raw
                .memory_lifetime
                .as_deref()
                .map(MemoryLifetime::parse_wire)
                .transpose()?
                .unwrap_or(def.memory_lifetime),
            preserve_named: raw.preserve_named.unwrap_or(def.preserve_named),
            lifetime_count_mode: raw
                .lifetime_count_mode
                .as_deref()
                .map(LifetimeCountMode::parse_wire)
                .transpose()?
                .unwrap_or(def.lifetime_count_mode),
        })
    }
}

impl IntegritySettings {
    /// Resolve a raw wire object, replacing any unknown enum name with the
    /// field default and logging a warning.
    #[must_use]
    pub fn resolve_lenient(raw: RawIntegritySettings) -> Self {
        let def = Self::default();
        Self {
            remove_on_player_block_break: raw
                .remove_on_player_block_break
                .unwrap_or(def.remove_on_player_block_break),
            check_periodically_for_missing_blocks: raw
                .check_periodically_for_missing_blocks
                .unwrap_or(def.check_periodically_for_missing_blocks),
            memory_lifetime: or_default_logged(raw.memory_lifetime.as_deref(), def.memory_lifetime),
            preserve_named: raw.preserve_named.unwrap_or(def.preserve_named),
            lifetime_count_mode: or_default_logged(
                raw.lifetime_count_mode.as_deref(),
                def.lifetime_count_mode,
            ),
        }
    }

    /// Strictly decode the JSON wire format.
    ///
    /// # Errors
    /// Returns [`ChestmemError::Serialization`] for malformed JSON and for
    /// unknown enum names (the message names the field and value).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ChestmemError::Serialization(e.to_string()))
    }

    /// Decode the JSON wire format, defaulting unknown enum names per field.
    ///
    /// # Errors
    /// Returns [`ChestmemError::Serialization`] if the JSON itself is
    /// malformed or a boolean key holds a non-boolean.
    pub fn from_json_lenient(json: &str) -> Result<Self> {
        let raw: RawIntegritySettings =
            serde_json::from_str(json).map_err(|e| ChestmemError::Serialization(e.to_string()))?;
        Ok(Self::resolve_lenient(raw))
    }

    /// Encode to the JSON wire format.
    ///
    /// # Errors
    /// Returns [`ChestmemError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ChestmemError::Serialization(e.to_string()))
    }
}

fn or_default_logged<E: WireEnum + fmt::Display>(value: Option<&str>, default: E) -> E {
    match value.map(E::parse_wire) {
        None => default,
        Some(Ok(parsed)) => parsed,
        Some(Err(e)) => {
            warn!(error = %e, default = %default, "Falling back to default integrity setting");
            default
        }
    }
}

/// `deserialize_with` adapter applying the lenient decode policy.
///
/// # Errors
/// Only fails when the wire object itself is malformed.
pub fn lenient<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<IntegritySettings, D::Error> {
    RawIntegritySettings::deserialize(deserializer).map(IntegritySettings::resolve_lenient)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let settings = IntegritySettings::from_json("{}").expect("decode");
        assert_eq!(settings, IntegritySettings::default());
        assert!(settings.remove_on_player_block_break);
        assert!(settings.check_periodically_for_missing_blocks);
        assert_eq!(settings.memory_lifetime, MemoryLifetime::TwelveHours);
        assert!(settings.preserve_named);
        assert_eq!(settings.lifetime_count_mode, LifetimeCountMode::LoadedTime);
    }

    #[test]
    fn partial_object_keeps_other_defaults() {
        let settings = IntegritySettings::from_json(
            r#"{"memoryLifetime":"TEN_SECONDS","preserveNamed":false}"#,
        )
        .expect("decode");
        assert_eq!(settings.memory_lifetime, MemoryLifetime::TenSeconds);
        assert!(!settings.preserve_named);
        assert!(settings.remove_on_player_block_break);
        assert_eq!(settings.lifetime_count_mode, LifetimeCountMode::LoadedTime);
    }

    #[test]
    fn strict_decode_names_field_and_value() {
        let err = IntegritySettings::from_json(r#"{"lifetimeCountMode":"GAME_TIME"}"#)
            .expect_err("unknown mode");
        let msg = err.to_string();
        assert!(msg.contains("lifetimeCountMode"), "{msg}");
        assert!(msg.contains("GAME_TIME"), "{msg}");
    }

    #[test]
    fn lenient_decode_defaults_only_the_bad_field() {
        let settings = IntegritySettings::from_json_lenient(
            r#"{"memoryLifetime":"FOREVER","lifetimeCountMode":"REAL_TIME"}"#,
        )
        .expect("decode");
        assert_eq!(settings.memory_lifetime, MemoryLifetime::TwelveHours);
        assert_eq!(settings.lifetime_count_mode, LifetimeCountMode::RealTime);
    }

    #[test]
    fn lenient_decode_still_rejects_bad_json() {
        assert!(IntegritySettings::from_json_lenient("{not json").is_err());
    }

    #[test]
    fn wire_format_uses_camel_case_and_upper_names() {
        let json = IntegritySettings::default().to_json().expect("encode");
        assert!(json.contains("\"memoryLifetime\":\"TWELVE_HOURS\""), "{json}");
        assert!(json.contains("\"lifetimeCountMode\":\"LOADED_TIME\""), "{json}");
        let back = IntegritySettings::from_json(&json).expect("decode");
        assert_eq!(back, IntegritySettings::default());
    }

    #[test]
    fn ladder_is_ordered_and_never_is_infinite() {
        let secs: Vec<u64> = MemoryLifetime::ALL.iter().filter_map(|l| l.seconds()).collect();
        assert_eq!(secs.len(), 13);
        assert!(secs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(MemoryLifetime::Never.span(), Lifetime::Infinite);
        assert_eq!(MemoryLifetime::TenSeconds.span(), Lifetime::Finite(10));
        assert_eq!(MemoryLifetime::TwelveHours.seconds(), Some(43_200));
    }

    #[test]
    fn every_wire_name_parses_back() {
        for lifetime in MemoryLifetime::ALL {
            assert_eq!(lifetime.to_string().parse::<MemoryLifetime>().ok(), Some(lifetime));
        }
        for mode in LifetimeCountMode::ALL {
            assert_eq!(mode.to_string().parse::<LifetimeCountMode>().ok(), Some(mode));
        }
    }
}
