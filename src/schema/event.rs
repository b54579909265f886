use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::player::PlayerContext;

/// The category of a generated event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Combat,
    Economic,
    Social,
    Political,
    Exploration,
    Mystical,
    Underworld,
    Personal,
    Custom(String),
}

impl EventType {
    /// The fixed category list events are drawn from.
    pub const BUILTIN: [EventType; 8] = [
        EventType::Combat,
        EventType::Economic,
        EventType::Social,
        EventType::Political,
        EventType::Exploration,
        EventType::Mystical,
        EventType::Underworld,
        EventType::Personal,
    ];

    /// Short lowercase name, also used as the event's type tag and as the
    /// corpus theme for this category.
    pub fn name(&self) -> &str {
        match self {
            Self::Combat => "combat",
            Self::Economic => "economic",
            Self::Social => "social",
            Self::Political => "political",
            Self::Exploration => "exploration",
            Self::Mystical => "mystical",
            Self::Underworld => "underworld",
            Self::Personal => "personal",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Parse a type name; unknown names become `Custom`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "combat" => Self::Combat,
            "economic" => Self::Economic,
            "social" => Self::Social,
            "political" => Self::Political,
            "exploration" => Self::Exploration,
            "mystical" => Self::Mystical,
            "underworld" => Self::Underworld,
            "personal" => Self::Personal,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single stat change carried by an effect.
///
/// Non-negative numbers are rewards, negative numbers are penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Amount(i64),
    /// Inclusive `[min, max]` outcome range.
    Range([i64; 2]),
    Flag(bool),
    Text(String),
}

/// Stat name to change. Ordered so serialized events are stable.
pub type Effect = BTreeMap<String, EffectValue>;

/// One option offered to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub effects: Effect,
}

/// A finished event. Plain data: never fed back into the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    /// Name of the difficulty tier the effects were scaled for.
    pub difficulty: String,
    pub choices: Vec<Choice>,
    pub tags: Vec<String>,
    pub context: PlayerContext,
}

impl Event {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
