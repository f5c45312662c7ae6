//! Power-mode profiles and the memory limits they carry.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Minimum number of messages size-based eviction will keep.
pub const DEFAULT_EVICTION_FLOOR: usize = 10;

/// The agent's behavior bundle.
///
/// Every string spelling (canonical names and the legacy `low` / `high` /
/// `chat` aliases) goes through [`Profile::normalize`]; nothing past the
/// boundary deals in strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Profile {
    /// Edge devices: short history, terse prompt.
    LowPower,
    /// Desktop/cloud: full retained history, detailed prompt.
    #[default]
    HighPower,
    /// Single-shot Q&A: no tools, no history, no system prompt.
    Chat,
}

impl Profile {
    /// Map any accepted spelling to a profile. Unknown values fall back to
    /// [`Profile::HighPower`].
    pub fn normalize(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low_power" | "low" => Profile::LowPower,
            "high_power" | "high" => Profile::HighPower,
            "chat" => Profile::Chat,
            other => {
                tracing::warn!(profile = other, "Unrecognized profile, using HIGH_POWER");
                Profile::HighPower
            }
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::LowPower => "LOW_POWER",
            Profile::HighPower => "HIGH_POWER",
            Profile::Chat => "CHAT",
        }
    }

    /// Whether tools are visible to the backend under this profile.
    pub fn tools_enabled(&self) -> bool {
        !matches!(self, Profile::Chat)
    }

    /// Which part of conversation memory is sent as context.
    pub fn history_policy(&self) -> HistoryPolicy {
        match self {
            Profile::LowPower => HistoryPolicy::CurrentRun,
            Profile::HighPower => HistoryPolicy::Full,
            Profile::Chat => HistoryPolicy::None,
        }
    }
}

impl From<&str> for Profile {
    fn from(value: &str) -> Self {
        Self::normalize(value)
    }
}

impl From<String> for Profile {
    fn from(value: String) -> Self {
        Self::normalize(&value)
    }
}

impl From<Profile> for String {
    fn from(profile: Profile) -> Self {
        profile.as_str().to_string()
    }
}

impl FromStr for Profile {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// History visibility when building backend context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Only messages appended since the current run began.
    CurrentRun,
    /// Everything memory still retains.
    Full,
    /// Nothing but the raw user input.
    None,
}

/// Retention limits for conversation memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimits {
    /// Count ceiling.
    pub max_messages: usize,

    /// Ceiling on the serialized size of the whole message sequence.
    pub max_bytes: usize,

    /// Size-based eviction never goes below this many messages.
    #[serde(default = "default_floor")]
    pub floor: usize,
}

fn default_floor() -> usize {
    DEFAULT_EVICTION_FLOOR
}

impl MemoryLimits {
    pub const LOW_POWER: MemoryLimits = MemoryLimits {
        max_messages: 20,
        max_bytes: 50_000,
        floor: DEFAULT_EVICTION_FLOOR,
    };

    pub const HIGH_POWER: MemoryLimits = MemoryLimits {
        max_messages: 100,
        max_bytes: 200_000,
        floor: DEFAULT_EVICTION_FLOOR,
    };
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self::HIGH_POWER
    }
}

/// Per-profile memory limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTable {
    #[serde(default = "low_power_limits")]
    pub low_power: MemoryLimits,

    #[serde(default = "high_power_limits")]
    pub high_power: MemoryLimits,

    /// Chat never touches memory; these only size the unused store.
    #[serde(default = "low_power_limits")]
    pub chat: MemoryLimits,
}

fn low_power_limits() -> MemoryLimits {
    MemoryLimits::LOW_POWER
}
fn high_power_limits() -> MemoryLimits {
    MemoryLimits::HIGH_POWER
}

impl ProfileTable {
    pub fn limits(&self, profile: Profile) -> MemoryLimits {
        match profile {
            Profile::LowPower => self.low_power,
            Profile::HighPower => self.high_power,
            Profile::Chat => self.chat,
        }
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            low_power: MemoryLimits::LOW_POWER,
            high_power: MemoryLimits::HIGH_POWER,
            chat: MemoryLimits::LOW_POWER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_aliases_normalize() {
        assert_eq!(Profile::normalize("low"), Profile::LowPower);
        assert_eq!(Profile::normalize("high"), Profile::HighPower);
        assert_eq!(Profile::normalize("chat"), Profile::Chat);
    }

    #[test]
    fn canonical_names_normalize() {
        assert_eq!(Profile::normalize("LOW_POWER"), Profile::LowPower);
        assert_eq!(Profile::normalize("HIGH_POWER"), Profile::HighPower);
        assert_eq!(Profile::normalize("CHAT"), Profile::Chat);
        assert_eq!(Profile::normalize("  low_power "), Profile::LowPower);
    }

    #[test]
    fn unknown_defaults_to_high_power() {
        assert_eq!(Profile::normalize("turbo"), Profile::HighPower);
        assert_eq!(Profile::normalize(""), Profile::HighPower);
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&Profile::LowPower).unwrap();
        assert_eq!(json, r#""LOW_POWER""#);
        let p: Profile = serde_json::from_str(r#""high""#).unwrap();
        assert_eq!(p, Profile::HighPower);
    }

    #[test]
    fn profile_behavior_table() {
        assert!(!Profile::Chat.tools_enabled());
        assert!(Profile::LowPower.tools_enabled());
        assert_eq!(Profile::LowPower.history_policy(), HistoryPolicy::CurrentRun);
        assert_eq!(Profile::HighPower.history_policy(), HistoryPolicy::Full);
        assert_eq!(Profile::Chat.history_policy(), HistoryPolicy::None);
    }

    #[test]
    fn default_limits_per_profile() {
        let table = ProfileTable::default();
        assert_eq!(table.limits(Profile::LowPower).max_messages, 20);
        assert_eq!(table.limits(Profile::LowPower).max_bytes, 50_000);
        assert_eq!(table.limits(Profile::HighPower).max_messages, 100);
        assert_eq!(table.limits(Profile::HighPower).max_bytes, 200_000);
        assert_eq!(table.limits(Profile::HighPower).floor, 10);
    }
}
