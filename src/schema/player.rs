use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A dynamic value carried by an attribute the engine has no typed field for.
///
/// Deserializes untagged, so a plain JSON/RON object such as
/// `{"stealth": 40, "homeland": "Ravenmoor"}` maps straight onto
/// `PlayerContext::extras`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<AttributeValue>),
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Render scalar values as display text. Lists and maps have no
    /// literal form.
    pub fn as_literal(&self) -> Option<String> {
        match self {
            Self::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Self::Number(n) if n.is_finite() => {
                if n.fract() == 0.0 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{:.1}", n))
                }
            }
            _ => None,
        }
    }
}

/// Raw player attributes handed to a single generation call.
///
/// Every attribute is optional; absent values fall back to
/// [`PlayerContext::DEFAULTS`]. Keys with no typed field are collected into
/// `extras` and drive the heuristic attribute pass of the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career: Option<String>,
    /// Named skill values, nominally 0..=100.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub skills: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, AttributeValue>,
}

/// Fallback values for every known attribute.
#[derive(Debug, Clone, Copy)]
pub struct ContextDefaults {
    pub age: f64,
    pub gold: f64,
    pub influence: f64,
    pub health: f64,
    pub level: f64,
    pub reputation: f64,
    pub career: &'static str,
}

impl PlayerContext {
    pub const DEFAULTS: ContextDefaults = ContextDefaults {
        age: 25.0,
        gold: 50.0,
        influence: 5.0,
        health: 100.0,
        level: 1.0,
        reputation: 0.0,
        career: "wanderer",
    };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_gold(mut self, gold: f64) -> Self {
        self.gold = Some(gold);
        self
    }

    pub fn with_influence(mut self, influence: f64) -> Self {
        self.influence = Some(influence);
        self
    }

    pub fn with_health(mut self, health: f64) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_reputation(mut self, reputation: f64) -> Self {
        self.reputation = Some(reputation);
        self
    }

    pub fn with_career(mut self, career: &str) -> Self {
        self.career = Some(career.to_string());
        self
    }

    pub fn with_skill(mut self, name: &str, value: f64) -> Self {
        self.skills.insert(name.to_string(), value);
        self
    }

    pub fn with_extra(mut self, key: &str, value: AttributeValue) -> Self {
        self.extras.insert(key.to_string(), value);
        self
    }

    // Non-finite inputs are treated as absent.

    pub fn age_or_default(&self) -> f64 {
        finite_or(self.age, Self::DEFAULTS.age)
    }

    pub fn gold_or_default(&self) -> f64 {
        finite_or(self.gold, Self::DEFAULTS.gold)
    }

    pub fn influence_or_default(&self) -> f64 {
        finite_or(self.influence, Self::DEFAULTS.influence)
    }

    pub fn health_or_default(&self) -> f64 {
        finite_or(self.health, Self::DEFAULTS.health)
    }

    pub fn level_or_default(&self) -> f64 {
        finite_or(self.level, Self::DEFAULTS.level)
    }

    pub fn reputation_or_default(&self) -> f64 {
        finite_or(self.reputation, Self::DEFAULTS.reputation)
    }

    pub fn career_or_default(&self) -> &str {
        match self.career.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => Self::DEFAULTS.career,
        }
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}
