/// Difficulty scaling — power level to tier lookup, effect scaling, and
/// event-type weight adjustment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::core::context;
use crate::schema::event::{Choice, Effect, EffectValue, EventType};
use crate::schema::player::PlayerContext;

#[derive(Debug, Error)]
pub enum TierError {
    #[error("difficulty tier is missing a name")]
    MissingName,
    #[error("power range must have exactly 2 bounds, got {0}")]
    RangeArity(usize),
    #[error("power range [{0}, {1}] is inverted")]
    InvertedRange(i32, i32),
    #[error("tier '{0}' has a negative or non-finite multiplier")]
    InvalidMultiplier(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A named difficulty band with its effect multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTier {
    pub name: String,
    /// Inclusive `[low, high]` power-level range.
    pub power_range: [i32; 2],
    pub reward_multiplier: f64,
    pub penalty_multiplier: f64,
}

impl DifficultyTier {
    pub fn new(name: &str, low: i32, high: i32, reward: f64, penalty: f64) -> Self {
        Self {
            name: name.to_string(),
            power_range: [low, high],
            reward_multiplier: reward,
            penalty_multiplier: penalty,
        }
    }

    /// Build a tier from loosely-typed parts, as a host passing a plain
    /// array would.
    pub fn from_parts(
        name: &str,
        power_range: &[i32],
        reward_multiplier: f64,
        penalty_multiplier: f64,
    ) -> Result<Self, TierError> {
        let [low, high] = <[i32; 2]>::try_from(power_range)
            .map_err(|_| TierError::RangeArity(power_range.len()))?;
        let tier = Self::new(name, low, high, reward_multiplier, penalty_multiplier);
        tier.validate()?;
        Ok(tier)
    }

    pub fn validate(&self) -> Result<(), TierError> {
        if self.name.trim().is_empty() {
            return Err(TierError::MissingName);
        }
        let [low, high] = self.power_range;
        if low > high {
            return Err(TierError::InvertedRange(low, high));
        }
        let valid = |m: f64| m.is_finite() && m >= 0.0;
        if !valid(self.reward_multiplier) || !valid(self.penalty_multiplier) {
            return Err(TierError::InvalidMultiplier(self.name.clone()));
        }
        Ok(())
    }

    pub fn contains(&self, power_level: i32) -> bool {
        self.power_range[0] <= power_level && power_level <= self.power_range[1]
    }

    fn midpoint(&self) -> f64 {
        (f64::from(self.power_range[0]) + f64::from(self.power_range[1])) / 2.0
    }

    /// Scale one number: rewards (including zero) by the reward
    /// multiplier, penalties by the penalty multiplier.
    pub fn scale_amount(&self, value: i64) -> i64 {
        let multiplier = if value >= 0 {
            self.reward_multiplier
        } else {
            self.penalty_multiplier
        };
        (value as f64 * multiplier).round() as i64
    }

    /// Scale every numeric field of an effect. Range bounds scale
    /// independently; flags and text pass through.
    pub fn scale_effect(&self, effect: &Effect) -> Effect {
        effect
            .iter()
            .map(|(stat, value)| {
                let scaled = match value {
                    EffectValue::Amount(v) => EffectValue::Amount(self.scale_amount(*v)),
                    EffectValue::Range([min, max]) => {
                        EffectValue::Range([self.scale_amount(*min), self.scale_amount(*max)])
                    }
                    other => other.clone(),
                };
                (stat.clone(), scaled)
            })
            .collect()
    }
}

/// A choice with both its authored and its tier-scaled effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledChoice {
    pub text: String,
    pub original_effects: Effect,
    pub effects: Effect,
    pub tier: String,
}

pub fn default_tiers() -> Vec<DifficultyTier> {
    vec![
        DifficultyTier::new("easy", 0, 35, 0.8, 0.6),
        DifficultyTier::new("normal", 36, 60, 1.0, 1.0),
        DifficultyTier::new("hard", 61, 85, 1.5, 1.3),
        DifficultyTier::new("legendary", 86, 100, 2.0, 1.6),
    ]
}

/// Default challenge rating (1..=10) for each built-in event type.
fn default_challenge_ratings() -> BTreeMap<EventType, u8> {
    [
        (EventType::Combat, 8),
        (EventType::Underworld, 7),
        (EventType::Political, 6),
        (EventType::Mystical, 6),
        (EventType::Exploration, 5),
        (EventType::Economic, 4),
        (EventType::Social, 3),
        (EventType::Personal, 2),
    ]
    .into_iter()
    .collect()
}

const DEFAULT_CHALLENGE_RATING: u8 = 5;

/// Owns the ordered tier list and the challenge-rating table.
#[derive(Debug, Clone)]
pub struct DifficultyScaler {
    /// Sorted by lower bound; names unique.
    tiers: Vec<DifficultyTier>,
    challenge_ratings: BTreeMap<EventType, u8>,
}

impl Default for DifficultyScaler {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            challenge_ratings: default_challenge_ratings(),
        }
    }
}

impl DifficultyScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scaler with the given tiers instead of the defaults.
    pub fn with_tiers(tiers: Vec<DifficultyTier>) -> Result<Self, TierError> {
        let mut scaler = Self {
            tiers: Vec::new(),
            challenge_ratings: default_challenge_ratings(),
        };
        for tier in tiers {
            scaler.add_tier(tier)?;
        }
        Ok(scaler)
    }

    /// Parse a RON list of tiers, e.g.
    /// `[(name: "easy", power_range: (0, 35), reward_multiplier: 0.8, penalty_multiplier: 0.6)]`.
    pub fn parse_tiers_ron(input: &str) -> Result<Vec<DifficultyTier>, TierError> {
        let tiers: Vec<DifficultyTier> = ron::from_str(input)?;
        for tier in &tiers {
            tier.validate()?;
        }
        Ok(tiers)
    }

    pub fn load_tiers_from_ron(path: &Path) -> Result<Vec<DifficultyTier>, TierError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_tiers_ron(&contents)
    }

    pub fn tiers(&self) -> &[DifficultyTier] {
        &self.tiers
    }

    pub fn power_level(&self, context: &PlayerContext) -> u8 {
        context::power_level(context)
    }

    /// Add a tier, replacing any tier with the same name, and re-sort.
    pub fn add_tier(&mut self, tier: DifficultyTier) -> Result<(), TierError> {
        tier.validate()?;
        if let Some(pos) = self.tiers.iter().position(|t| t.name == tier.name) {
            tracing::info!("replacing difficulty tier '{}'", tier.name);
            self.tiers.remove(pos);
        }
        self.tiers.push(tier);
        self.tiers.sort_by_key(|t| t.power_range[0]);
        Ok(())
    }

    /// Returns true if a tier with that name was present.
    pub fn remove_tier(&mut self, name: &str) -> bool {
        let before = self.tiers.len();
        self.tiers.retain(|t| t.name != name);
        self.tiers.len() != before
    }

    /// Tier for a power level.
    ///
    /// Among tiers containing the level, the one with the greatest lower
    /// bound wins (first in list order on equal bounds). If none contains
    /// it, the tier with the nearest midpoint wins, first on ties. An empty
    /// tier list yields a neutral "normal" tier.
    pub fn tier_for(&self, power_level: i32) -> DifficultyTier {
        let mut best: Option<&DifficultyTier> = None;
        for tier in self.tiers.iter().filter(|t| t.contains(power_level)) {
            match best {
                Some(b) if b.power_range[0] >= tier.power_range[0] => {}
                _ => best = Some(tier),
            }
        }
        if let Some(tier) = best {
            return tier.clone();
        }

        let target = f64::from(power_level);
        let mut nearest: Option<(&DifficultyTier, f64)> = None;
        for tier in &self.tiers {
            let distance = (tier.midpoint() - target).abs();
            match nearest {
                Some((_, d)) if d <= distance => {}
                _ => nearest = Some((tier, distance)),
            }
        }
        match nearest {
            Some((tier, _)) => {
                tracing::debug!(
                    "power level {} outside every tier; using nearest '{}'",
                    power_level,
                    tier.name
                );
                tier.clone()
            }
            None => DifficultyTier::new("normal", 0, 100, 1.0, 1.0),
        }
    }

    /// Scale each choice's effects for the context's tier, keeping the
    /// originals alongside.
    pub fn scale_effects(&self, choices: &[Choice], context: &PlayerContext) -> Vec<ScaledChoice> {
        let tier = self.tier_for(i32::from(self.power_level(context)));
        choices
            .iter()
            .map(|choice| ScaledChoice {
                text: choice.text.clone(),
                original_effects: choice.effects.clone(),
                effects: tier.scale_effect(&choice.effects),
                tier: tier.name.clone(),
            })
            .collect()
    }

    pub fn set_challenge_rating(&mut self, event_type: EventType, rating: u8) {
        self.challenge_ratings.insert(event_type, rating.clamp(1, 10));
    }

    pub fn challenge_rating(&self, event_type: &EventType) -> u8 {
        self.challenge_ratings
            .get(event_type)
            .copied()
            .unwrap_or(DEFAULT_CHALLENGE_RATING)
    }

    /// Damp hard event types for easy tiers and trivial ones for
    /// legendary tiers. Results are never negative.
    pub fn adjust_weights(
        &self,
        weights: &BTreeMap<EventType, f64>,
        tier: &DifficultyTier,
    ) -> BTreeMap<EventType, f64> {
        weights
            .iter()
            .map(|(event_type, weight)| {
                let rating = self.challenge_rating(event_type);
                let mut adjusted = *weight;
                if tier.name == "easy" && rating > 6 {
                    adjusted *= 0.3;
                } else if tier.name == "legendary" && rating < 4 {
                    adjusted *= 0.5;
                }
                (event_type.clone(), adjusted.max(0.0))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(name: &str, low: i32, high: i32) -> DifficultyTier {
        DifficultyTier::new(name, low, high, 1.0, 1.0)
    }

    #[test]
    fn default_tiers_cover_scenarios() {
        let scaler = DifficultyScaler::new();
        let weak = PlayerContext::new()
            .with_level(1.0)
            .with_gold(10.0)
            .with_influence(0.0)
            .with_health(100.0);
        let strong = PlayerContext::new()
            .with_level(20.0)
            .with_gold(100_000.0)
            .with_influence(100.0)
            .with_health(100.0);
        let weak_level = scaler.power_level(&weak);
        assert_eq!(scaler.tier_for(i32::from(weak_level)).name, "easy");
        let strong_level = scaler.power_level(&strong);
        assert_eq!(strong_level, 96);
        assert_eq!(scaler.tier_for(i32::from(strong_level)).name, "legendary");
        assert_eq!(scaler.tier_for(100).name, "legendary");
    }

    #[test]
    fn tier_lookup_is_total() {
        let scaler = DifficultyScaler::new();
        for level in 0..=200 {
            let t = scaler.tier_for(level);
            assert!(!t.name.is_empty());
            if level <= 100 {
                assert!(t.contains(level), "level {} got {}", level, t.name);
            }
        }
    }

    #[test]
    fn overlap_prefers_greatest_lower_bound() {
        let scaler = DifficultyScaler::with_tiers(vec![
            tier("wide", 0, 100),
            tier("narrow", 40, 60),
            tier("mid", 20, 80),
        ])
        .unwrap();
        assert_eq!(scaler.tier_for(50).name, "narrow");
        assert_eq!(scaler.tier_for(30).name, "mid");
        assert_eq!(scaler.tier_for(10).name, "wide");
    }

    #[test]
    fn gaps_fall_back_to_nearest_midpoint() {
        let scaler =
            DifficultyScaler::with_tiers(vec![tier("low", 0, 10), tier("high", 30, 40)]).unwrap();
        // midpoints 5 and 35
        assert_eq!(scaler.tier_for(15).name, "low");
        assert_eq!(scaler.tier_for(25).name, "high");
        // equidistant: first in list order
        assert_eq!(scaler.tier_for(20).name, "low");
        assert_eq!(scaler.tier_for(500).name, "high");
        assert_eq!(scaler.tier_for(-50).name, "low");
    }

    #[test]
    fn empty_tier_list_still_answers() {
        let mut scaler = DifficultyScaler::new();
        for name in ["easy", "normal", "hard", "legendary"] {
            assert!(scaler.remove_tier(name));
        }
        assert!(!scaler.remove_tier("easy"));
        assert_eq!(scaler.tier_for(42).name, "normal");
    }

    #[test]
    fn add_tier_replaces_duplicates_and_sorts() {
        let mut scaler = DifficultyScaler::new();
        scaler
            .add_tier(DifficultyTier::new("easy", 50, 55, 3.0, 3.0))
            .unwrap();
        assert_eq!(scaler.tiers().len(), 4);
        let names: Vec<&str> = scaler.tiers().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["normal", "easy", "hard", "legendary"]);
        assert_eq!(scaler.tier_for(52).name, "easy");
    }

    #[test]
    fn invalid_tiers_rejected() {
        let mut scaler = DifficultyScaler::new();
        assert!(matches!(
            scaler.add_tier(DifficultyTier::new("  ", 0, 10, 1.0, 1.0)),
            Err(TierError::MissingName)
        ));
        assert!(matches!(
            DifficultyTier::from_parts("odd", &[1, 2, 3], 1.0, 1.0),
            Err(TierError::RangeArity(3))
        ));
        assert!(matches!(
            DifficultyTier::from_parts("odd", &[9, 2], 1.0, 1.0),
            Err(TierError::InvertedRange(9, 2))
        ));
        assert!(matches!(
            scaler.add_tier(DifficultyTier::new("nan", 0, 1, f64::NAN, 1.0)),
            Err(TierError::InvalidMultiplier(_))
        ));
        assert_eq!(scaler.tiers().len(), 4);
    }

    #[test]
    fn scaling_uses_sign_specific_multiplier() {
        let t = DifficultyTier::new("hard", 61, 85, 1.5, 1.3);
        assert_eq!(t.scale_amount(10), 15);
        assert_eq!(t.scale_amount(-10), -13);
        assert_eq!(t.scale_amount(0), 0);
        assert_eq!(t.scale_amount(7), 11); // 10.5 rounds away from zero
        assert_eq!(t.scale_amount(-5), -7); // -6.5 rounds away from zero

        // zero counts as a reward
        let lopsided = DifficultyTier::new("odd", 0, 1, 0.0, 5.0);
        assert_eq!(lopsided.scale_amount(0), 0);
        assert_eq!(lopsided.scale_amount(-1), -5);
    }

    #[test]
    fn ranges_straddling_zero_scale_each_bound() {
        let t = DifficultyTier::new("hard", 61, 85, 2.0, 1.5);
        let mut effect = Effect::new();
        effect.insert("gold".to_string(), EffectValue::Range([-10, 20]));
        effect.insert("cursed".to_string(), EffectValue::Flag(true));
        let scaled = t.scale_effect(&effect);
        assert_eq!(scaled["gold"], EffectValue::Range([-15, 40]));
        assert_eq!(scaled["cursed"], EffectValue::Flag(true));
    }

    #[test]
    fn scale_effects_keeps_originals() {
        let scaler = DifficultyScaler::new();
        let mut effects = Effect::new();
        effects.insert("gold".to_string(), EffectValue::Amount(100));
        let choices = vec![Choice {
            text: "Take the bribe".to_string(),
            effects,
        }];
        let rich = PlayerContext::new()
            .with_level(20.0)
            .with_gold(1e7)
            .with_influence(100.0);
        let scaled = scaler.scale_effects(&choices, &rich);
        assert_eq!(scaled[0].tier, "legendary");
        assert_eq!(scaled[0].original_effects["gold"], EffectValue::Amount(100));
        assert_eq!(scaled[0].effects["gold"], EffectValue::Amount(200));
    }

    #[test]
    fn weight_adjustment() {
        let scaler = DifficultyScaler::new();
        let weights: BTreeMap<EventType, f64> = [
            (EventType::Combat, 1.0),
            (EventType::Social, 1.0),
            (EventType::Custom("heist".to_string()), 1.0),
            (EventType::Personal, -3.0),
        ]
        .into_iter()
        .collect();

        let easy = scaler.tier_for(10);
        let adjusted = scaler.adjust_weights(&weights, &easy);
        assert!((adjusted[&EventType::Combat] - 0.3).abs() < 1e-9);
        assert_eq!(adjusted[&EventType::Social], 1.0);
        assert_eq!(adjusted[&EventType::Custom("heist".to_string())], 1.0);
        assert_eq!(adjusted[&EventType::Personal], 0.0);

        let legendary = scaler.tier_for(95);
        let adjusted = scaler.adjust_weights(&weights, &legendary);
        assert_eq!(adjusted[&EventType::Combat], 1.0);
        assert_eq!(adjusted[&EventType::Social], 0.5);
    }

    #[test]
    fn tiers_parse_from_ron() {
        let ron = r#"[
            (name: "calm", power_range: (0, 49), reward_multiplier: 1.0, penalty_multiplier: 0.5),
            (name: "storm", power_range: (50, 100), reward_multiplier: 1.8, penalty_multiplier: 1.4),
        ]"#;
        let tiers = DifficultyScaler::parse_tiers_ron(ron).unwrap();
        let scaler = DifficultyScaler::with_tiers(tiers).unwrap();
        assert_eq!(scaler.tier_for(75).name, "storm");

        let bad = r#"[(name: "", power_range: (0, 1), reward_multiplier: 1.0, penalty_multiplier: 1.0)]"#;
        assert!(DifficultyScaler::parse_tiers_ron(bad).is_err());
    }
}
