/// Context analysis — normalizes raw player attributes into a derived
/// profile and collects generation modifiers from heuristics and
/// registered handlers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

use crate::schema::event::EventType;
use crate::schema::player::{AttributeValue, PlayerContext};

/// Each power-level component contributes at most this many points.
const SUB_SCORE_CAP: f64 = 25.0;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler rejected context: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WealthTier {
    Poor,
    Moderate,
    Wealthy,
    Rich,
}

impl WealthTier {
    pub fn from_gold(gold: f64) -> Self {
        if gold < 100.0 {
            Self::Poor
        } else if gold < 1_000.0 {
            Self::Moderate
        } else if gold < 10_000.0 {
            Self::Wealthy
        } else {
            Self::Rich
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Moderate => "moderate",
            Self::Wealthy => "wealthy",
            Self::Rich => "rich",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceTier {
    Low,
    Medium,
    High,
    Elite,
}

impl InfluenceTier {
    pub fn from_influence(influence: f64) -> Self {
        if influence < 10.0 {
            Self::Low
        } else if influence < 50.0 {
            Self::Medium
        } else if influence < 100.0 {
            Self::High
        } else {
            Self::Elite
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Elite => "elite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Youth,
    Adult,
    Experienced,
    Elder,
}

impl LifeStage {
    pub fn from_age(age: f64) -> Self {
        if age < 18.0 {
            Self::Youth
        } else if age < 35.0 {
            Self::Adult
        } else if age < 60.0 {
            Self::Experienced
        } else {
            Self::Elder
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Youth => "youth",
            Self::Adult => "adult",
            Self::Experienced => "experienced",
            Self::Elder => "elder",
        }
    }
}

/// Skill aptitudes, each 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub combat: u8,
    pub social: u8,
    pub magic: u8,
    pub technical: u8,
}

impl SkillProfile {
    /// The aptitude that best matches an event type, if any does.
    pub fn for_event_type(&self, event_type: &EventType) -> Option<(&'static str, u8)> {
        match event_type {
            EventType::Combat => Some(("combat", self.combat)),
            EventType::Social | EventType::Political => Some(("social", self.social)),
            EventType::Mystical => Some(("magic", self.magic)),
            EventType::Exploration | EventType::Economic => Some(("technical", self.technical)),
            _ => None,
        }
    }
}

/// Inferred personality traits, each 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub risk_tolerance: f64,
    pub social_preference: f64,
    pub ambition_level: f64,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            risk_tolerance: 0.5,
            social_preference: 0.5,
            ambition_level: 0.5,
        }
    }
}

/// Derived, read-only snapshot of a player context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedContext {
    pub power_level: u8,
    pub wealth_tier: WealthTier,
    pub influence_tier: InfluenceTier,
    pub life_stage: LifeStage,
    pub skill_profile: SkillProfile,
    pub personality: Personality,
}

impl AnalyzedContext {
    /// The snapshot an empty context produces.
    pub fn baseline() -> Self {
        analyze(&PlayerContext::default())
    }
}

/// Generation modifiers collected from the heuristic attribute pass and
/// from registered handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextModifiers {
    /// Added to the power level before tier lookup.
    pub difficulty_modifier: f64,
    /// Multiplies non-negative effect amounts.
    pub reward_modifier: f64,
    pub event_type_preferences: Vec<EventType>,
    pub custom_tags: Vec<String>,
}

impl Default for ContextModifiers {
    fn default() -> Self {
        Self {
            difficulty_modifier: 0.0,
            reward_modifier: 1.0,
            event_type_preferences: Vec::new(),
            custom_tags: Vec::new(),
        }
    }
}

/// A handler's contribution. Absent scalars leave the total untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialModifiers {
    pub difficulty_modifier: Option<f64>,
    pub reward_modifier: Option<f64>,
    pub event_type_preferences: Vec<EventType>,
    pub custom_tags: Vec<String>,
}

impl ContextModifiers {
    /// Difficulty adds, reward multiplies, lists concatenate.
    pub fn merge(&mut self, partial: PartialModifiers) {
        if let Some(d) = partial.difficulty_modifier.filter(|d| d.is_finite()) {
            self.difficulty_modifier += d;
        }
        if let Some(r) = partial.reward_modifier.filter(|r| r.is_finite() && *r >= 0.0) {
            self.reward_modifier *= r;
        }
        self.event_type_preferences
            .extend(partial.event_type_preferences);
        self.custom_tags.extend(partial.custom_tags);
    }
}

/// A pluggable source of extra modifiers for context attributes the
/// analyzer does not know about.
pub trait ContextHandler: Send + Sync {
    fn modifiers(
        &self,
        raw: &PlayerContext,
        analyzed: &AnalyzedContext,
    ) -> Result<PartialModifiers, HandlerError>;
}

impl<F> ContextHandler for F
where
    F: Fn(&PlayerContext, &AnalyzedContext) -> Result<PartialModifiers, HandlerError>
        + Send
        + Sync,
{
    fn modifiers(
        &self,
        raw: &PlayerContext,
        analyzed: &AnalyzedContext,
    ) -> Result<PartialModifiers, HandlerError> {
        self(raw, analyzed)
    }
}

/// Derive the full snapshot. Pure; never fails on missing fields.
pub fn analyze(raw: &PlayerContext) -> AnalyzedContext {
    AnalyzedContext {
        power_level: power_level(raw),
        wealth_tier: WealthTier::from_gold(raw.gold_or_default()),
        influence_tier: InfluenceTier::from_influence(raw.influence_or_default()),
        life_stage: LifeStage::from_age(raw.age_or_default()),
        skill_profile: skill_profile(raw),
        personality: personality(raw),
    }
}

/// Composite 0..=100 strength score from level, gold, influence and health.
pub fn power_level(raw: &PlayerContext) -> u8 {
    let level = raw.level_or_default().max(0.0);
    let gold = raw.gold_or_default().max(0.0);
    let influence = raw.influence_or_default().max(0.0);
    let health = raw.health_or_default().clamp(0.0, 100.0);

    let level_score = (level / 20.0).min(1.0) * SUB_SCORE_CAP;
    // Logarithmic so each extra coin matters less.
    let gold_score = ((gold + 1.0).log10() / 6.0).min(1.0) * SUB_SCORE_CAP;
    let influence_score = (influence / 100.0).min(1.0) * SUB_SCORE_CAP;
    let health_score = (health / 100.0) * SUB_SCORE_CAP;

    let total = level_score + gold_score + influence_score + health_score;
    total.round().clamp(0.0, 100.0) as u8
}

/// Skill-name substrings feeding each aptitude.
const SKILL_KEYWORDS: [(&str, &[&str]); 4] = [
    ("combat", &["combat", "sword", "archery", "fight", "melee", "blade"]),
    ("social", &["social", "persuasion", "charisma", "diplomacy", "speech", "etiquette"]),
    ("magic", &["magic", "arcane", "spell", "ritual", "mana"]),
    ("technical", &["technical", "craft", "engineer", "smith", "tinker", "alchemy"]),
];

fn skill_profile(raw: &PlayerContext) -> SkillProfile {
    let mut scores = [0u8; 4];
    for (name, value) in &raw.skills {
        if !value.is_finite() {
            continue;
        }
        let lowered = name.to_lowercase();
        let clamped = value.clamp(0.0, 100.0).round() as u8;
        for (slot, (_, needles)) in SKILL_KEYWORDS.iter().enumerate() {
            if needles.iter().any(|n| lowered.contains(n)) {
                scores[slot] = scores[slot].max(clamped);
            }
        }
    }
    SkillProfile {
        combat: scores[0],
        social: scores[1],
        magic: scores[2],
        technical: scores[3],
    }
}

/// (career substring, risk, social, ambition) nudges.
const CAREER_NUDGES: &[(&str, f64, f64, f64)] = &[
    ("merchant", 0.0, 0.2, 0.1),
    ("trader", 0.0, 0.2, 0.1),
    ("warrior", 0.2, 0.0, 0.0),
    ("soldier", 0.2, 0.0, 0.0),
    ("knight", 0.2, 0.0, 0.1),
    ("scholar", -0.1, -0.1, 0.0),
    ("mage", -0.1, -0.1, 0.1),
    ("thief", 0.3, -0.1, 0.0),
    ("rogue", 0.3, -0.1, 0.0),
    ("noble", 0.0, 0.2, 0.2),
    ("politic", 0.0, 0.2, 0.2),
];

fn personality(raw: &PlayerContext) -> Personality {
    let mut p = Personality::default();

    if raw.gold_or_default() > 5_000.0 {
        p.ambition_level += 0.2;
        p.risk_tolerance += 0.1;
    }

    let career = raw.career_or_default().to_lowercase();
    for (needle, risk, social, ambition) in CAREER_NUDGES {
        if career.contains(needle) {
            p.risk_tolerance += risk;
            p.social_preference += social;
            p.ambition_level += ambition;
        }
    }

    let influence = raw.influence_or_default();
    if influence > 30.0 {
        p.social_preference += 0.1;
    }
    if influence > 50.0 {
        p.ambition_level += 0.2;
    }

    if raw.age_or_default() > 50.0 {
        p.risk_tolerance -= 0.2;
    }

    p.risk_tolerance = p.risk_tolerance.clamp(0.0, 1.0);
    p.social_preference = p.social_preference.clamp(0.0, 1.0);
    p.ambition_level = p.ambition_level.clamp(0.0, 1.0);
    p
}

/// What an attribute rule does when its key matches.
#[derive(Debug, Clone, Copy)]
enum AttributeEffect {
    /// Favor the named event type; numeric values must be positive.
    Prefer(&'static str),
    /// Lower difficulty by `value * per_point`, capped at `cap`.
    EaseDifficulty { per_point: f64, cap: f64 },
    /// Raise difficulty by `value * per_point`, capped at `cap`, and tag.
    HardenDifficulty {
        per_point: f64,
        cap: f64,
        tag: &'static str,
    },
    /// Positive favors politics, negative favors the underworld.
    Standing,
    /// Multiply rewards by `1 + value / divisor` (value clamped to 0..=100).
    Fortune { divisor: f64 },
}

struct AttributeRule {
    needles: &'static [&'static str],
    effect: AttributeEffect,
}

/// Heuristic dispatch table for unknown attributes, matched by key
/// substring. Every matching rule applies, in table order.
const ATTRIBUTE_RULES: &[AttributeRule] = &[
    AttributeRule {
        needles: &["magic", "arcane", "mana", "spell"],
        effect: AttributeEffect::Prefer("mystical"),
    },
    AttributeRule {
        needles: &["stealth", "agility"],
        effect: AttributeEffect::EaseDifficulty {
            per_point: 0.1,
            cap: 10.0,
        },
    },
    AttributeRule {
        needles: &["reputation", "fame"],
        effect: AttributeEffect::Standing,
    },
    AttributeRule {
        needles: &["strength", "might"],
        effect: AttributeEffect::Prefer("combat"),
    },
    AttributeRule {
        needles: &["charm", "charisma"],
        effect: AttributeEffect::Prefer("social"),
    },
    AttributeRule {
        needles: &["trade", "merchant"],
        effect: AttributeEffect::Prefer("economic"),
    },
    AttributeRule {
        needles: &["wander", "travel", "explor"],
        effect: AttributeEffect::Prefer("exploration"),
    },
    AttributeRule {
        needles: &["luck", "fortune"],
        effect: AttributeEffect::Fortune { divisor: 200.0 },
    },
    AttributeRule {
        needles: &["curse", "corruption"],
        effect: AttributeEffect::HardenDifficulty {
            per_point: 0.1,
            cap: 10.0,
            tag: "cursed",
        },
    },
];

/// Run the heuristic pass over every extra attribute, in key order.
pub fn attribute_modifiers(raw: &PlayerContext) -> ContextModifiers {
    let mut mods = ContextModifiers::default();
    for (key, value) in &raw.extras {
        inspect_attribute(key, value, &mut mods);
    }
    let reputation = raw.reputation_or_default();
    if reputation != 0.0 {
        inspect_attribute("reputation", &AttributeValue::Number(reputation), &mut mods);
    }
    mods
}

fn inspect_attribute(key: &str, value: &AttributeValue, mods: &mut ContextModifiers) {
    let lowered = key.to_lowercase();

    match value {
        AttributeValue::Text(text) if !text.trim().is_empty() => {
            mods.custom_tags
                .push(format!("{}:{}", lowered, text.trim().to_lowercase()));
        }
        AttributeValue::List(items) if !items.is_empty() => {
            mods.custom_tags.push(lowered.clone());
        }
        AttributeValue::Map(children) => {
            for (child_key, child) in children {
                inspect_attribute(&format!("{}.{}", lowered, child_key), child, mods);
            }
            return;
        }
        _ => {}
    }

    for rule in ATTRIBUTE_RULES {
        if rule.needles.iter().any(|n| lowered.contains(n)) {
            apply_rule(rule.effect, value, mods);
        }
    }
}

/// Magnitude an attribute value carries into a rule: numbers as-is, list
/// length, and 1 for any other present value.
fn magnitude(value: &AttributeValue) -> f64 {
    match value {
        AttributeValue::Number(n) if n.is_finite() => *n,
        AttributeValue::Number(_) => 0.0,
        AttributeValue::Bool(b) => f64::from(u8::from(*b)),
        AttributeValue::List(items) => items.len() as f64,
        AttributeValue::Text(_) | AttributeValue::Map(_) => 1.0,
    }
}

fn apply_rule(effect: AttributeEffect, value: &AttributeValue, mods: &mut ContextModifiers) {
    let amount = magnitude(value);
    match effect {
        AttributeEffect::Prefer(name) => {
            if amount > 0.0 {
                mods.event_type_preferences.push(EventType::from_name(name));
            }
        }
        AttributeEffect::EaseDifficulty { per_point, cap } => {
            if amount > 0.0 {
                mods.difficulty_modifier -= (amount * per_point).min(cap);
            }
        }
        AttributeEffect::HardenDifficulty { per_point, cap, tag } => {
            if amount > 0.0 {
                mods.difficulty_modifier += (amount * per_point).min(cap);
                mods.custom_tags.push(tag.to_string());
            }
        }
        AttributeEffect::Standing => {
            if amount > 0.0 {
                mods.event_type_preferences.push(EventType::Political);
                mods.custom_tags.push("renowned".to_string());
            } else if amount < 0.0 {
                mods.event_type_preferences.push(EventType::Underworld);
                mods.custom_tags.push("infamous".to_string());
            }
        }
        AttributeEffect::Fortune { divisor } => {
            mods.reward_modifier *= 1.0 + amount.clamp(0.0, 100.0) / divisor;
        }
    }
}

/// Analyzer with a registry of named modifier handlers.
#[derive(Default)]
pub struct ContextAnalyzer {
    handlers: BTreeMap<String, Box<dyn ContextHandler>>,
}

impl std::fmt::Debug for ContextAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAnalyzer")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ContextAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, raw: &PlayerContext) -> AnalyzedContext {
        analyze(raw)
    }

    /// Register a handler. A handler with the same name is replaced.
    pub fn register_handler<H>(&mut self, name: &str, handler: H)
    where
        H: ContextHandler + 'static,
    {
        if self
            .handlers
            .insert(name.to_string(), Box::new(handler))
            .is_some()
        {
            tracing::debug!("replaced context handler '{}'", name);
        }
    }

    /// Register a closure handler.
    pub fn register_fn<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&PlayerContext, &AnalyzedContext) -> Result<PartialModifiers, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.register_handler(name, handler);
    }

    /// Returns true if a handler was registered under `name`.
    pub fn unregister_handler(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|k| k.as_str())
    }

    /// Collect modifiers: heuristic attribute pass first, then every
    /// handler in name order. A handler that errors or panics is skipped.
    pub fn modifiers(&self, raw: &PlayerContext, analyzed: &AnalyzedContext) -> ContextModifiers {
        let mut mods = attribute_modifiers(raw);

        for (name, handler) in &self.handlers {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| handler.modifiers(raw, analyzed)));
            match outcome {
                Ok(Ok(partial)) => mods.merge(partial),
                Ok(Err(e)) => {
                    tracing::warn!("context handler '{}' failed: {}", name, e);
                }
                Err(_) => {
                    tracing::warn!("context handler '{}' panicked; skipping it", name);
                }
            }
        }

        mods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(level: f64, gold: f64, influence: f64, health: f64) -> PlayerContext {
        PlayerContext::new()
            .with_level(level)
            .with_gold(gold)
            .with_influence(influence)
            .with_health(health)
    }

    #[test]
    fn wealth_tier_boundaries() {
        assert_eq!(WealthTier::from_gold(0.0), WealthTier::Poor);
        assert_eq!(WealthTier::from_gold(99.0), WealthTier::Poor);
        assert_eq!(WealthTier::from_gold(100.0), WealthTier::Moderate);
        assert_eq!(WealthTier::from_gold(999.0), WealthTier::Moderate);
        assert_eq!(WealthTier::from_gold(1_000.0), WealthTier::Wealthy);
        assert_eq!(WealthTier::from_gold(9_999.0), WealthTier::Wealthy);
        assert_eq!(WealthTier::from_gold(10_000.0), WealthTier::Rich);
    }

    #[test]
    fn influence_tier_boundaries() {
        assert_eq!(InfluenceTier::from_influence(9.0), InfluenceTier::Low);
        assert_eq!(InfluenceTier::from_influence(10.0), InfluenceTier::Medium);
        assert_eq!(InfluenceTier::from_influence(50.0), InfluenceTier::High);
        assert_eq!(InfluenceTier::from_influence(100.0), InfluenceTier::Elite);
    }

    #[test]
    fn life_stage_boundaries() {
        assert_eq!(LifeStage::from_age(17.0), LifeStage::Youth);
        assert_eq!(LifeStage::from_age(18.0), LifeStage::Adult);
        assert_eq!(LifeStage::from_age(35.0), LifeStage::Experienced);
        assert_eq!(LifeStage::from_age(60.0), LifeStage::Elder);
    }

    #[test]
    fn power_level_low_context() {
        // 1.25 + ~4.34 + 0 + 25
        assert_eq!(power_level(&ctx(1.0, 10.0, 0.0, 100.0)), 31);
    }

    #[test]
    fn power_level_saturates() {
        // gold only saturates at a million: log10(100_001) / 6 * 25 ~= 20.8
        assert_eq!(power_level(&ctx(20.0, 100_000.0, 100.0, 100.0)), 96);
        assert_eq!(power_level(&ctx(20.0, 1_000_000.0, 100.0, 100.0)), 100);
        assert_eq!(power_level(&ctx(500.0, 1e12, 1e6, 100.0)), 100);
    }

    #[test]
    fn power_level_bounded_for_hostile_input() {
        assert_eq!(power_level(&ctx(-5.0, -100.0, -3.0, -50.0)), 0);
        assert!(power_level(&ctx(10.0, 10.0, 10.0, 900.0)) <= 100);
    }

    #[test]
    fn power_level_monotonic_per_attribute() {
        let base = (5.0, 500.0, 20.0, 50.0);
        let mut last = [0u8; 4];
        for step in 0..50 {
            let x = step as f64;
            let levels = [
                power_level(&ctx(x, base.1, base.2, base.3)),
                power_level(&ctx(base.0, x * x * 10.0, base.2, base.3)),
                power_level(&ctx(base.0, base.1, x * 3.0, base.3)),
                power_level(&ctx(base.0, base.1, base.2, x * 2.0)),
            ];
            for (i, lvl) in levels.iter().enumerate() {
                assert!(*lvl >= last[i], "attribute {} decreased at step {}", i, step);
                last[i] = *lvl;
            }
        }
    }

    #[test]
    fn personality_clamped() {
        let raw = PlayerContext::new()
            .with_career("rogue thief knight warrior")
            .with_gold(10_000.0);
        let p = analyze(&raw).personality;
        assert_eq!(p.risk_tolerance, 1.0);
        assert!(p.social_preference >= 0.0);
    }

    #[test]
    fn personality_elder_scholar_is_cautious() {
        let raw = PlayerContext::new().with_career("Scholar").with_age(70.0);
        let p = analyze(&raw).personality;
        assert!((p.risk_tolerance - 0.2).abs() < 1e-9);
    }

    #[test]
    fn skill_profile_takes_best_match() {
        let raw = PlayerContext::new()
            .with_skill("Swordplay", 40.0)
            .with_skill("melee", 75.0)
            .with_skill("arcane_lore", 130.0);
        let profile = analyze(&raw).skill_profile;
        assert_eq!(profile.combat, 75);
        assert_eq!(profile.magic, 100);
        assert_eq!(profile.social, 0);
    }

    #[test]
    fn stealth_eases_difficulty_proportionally() {
        let raw = PlayerContext::new().with_extra("stealth", AttributeValue::Number(40.0));
        let mods = attribute_modifiers(&raw);
        assert!((mods.difficulty_modifier + 4.0).abs() < 1e-9);

        let raw = PlayerContext::new().with_extra("agility_rank", AttributeValue::Number(500.0));
        assert!((attribute_modifiers(&raw).difficulty_modifier + 10.0).abs() < 1e-9);
    }

    #[test]
    fn reputation_sign_picks_preference() {
        let good = PlayerContext::new().with_extra("guild_fame", AttributeValue::Number(20.0));
        let bad = PlayerContext::new().with_reputation(-15.0);
        assert_eq!(
            attribute_modifiers(&good).event_type_preferences,
            vec![EventType::Political]
        );
        let bad_mods = attribute_modifiers(&bad);
        assert_eq!(bad_mods.event_type_preferences, vec![EventType::Underworld]);
        assert!(bad_mods.custom_tags.contains(&"infamous".to_string()));
    }

    #[test]
    fn magic_attribute_prefers_mystical_and_nested_maps_recurse() {
        let mut inner = BTreeMap::new();
        inner.insert("mana_pool".to_string(), AttributeValue::Number(12.0));
        let raw = PlayerContext::new()
            .with_extra("gifts", AttributeValue::Map(inner))
            .with_extra("homeland", AttributeValue::Text("Ravenmoor".to_string()));
        let mods = attribute_modifiers(&raw);
        assert_eq!(mods.event_type_preferences, vec![EventType::Mystical]);
        assert!(mods.custom_tags.contains(&"homeland:ravenmoor".to_string()));
    }

    #[test]
    fn heuristic_pass_is_deterministic() {
        let raw = PlayerContext::new()
            .with_extra("luck", AttributeValue::Number(50.0))
            .with_extra("curse_level", AttributeValue::Number(30.0))
            .with_extra("strength", AttributeValue::Number(9.0))
            .with_extra("companions", AttributeValue::List(vec![AttributeValue::Bool(true)]));
        assert_eq!(attribute_modifiers(&raw), attribute_modifiers(&raw));
        let mods = attribute_modifiers(&raw);
        assert!((mods.reward_modifier - 1.25).abs() < 1e-9);
        assert!((mods.difficulty_modifier - 3.0).abs() < 1e-9);
    }

    #[test]
    fn handlers_merge_additively_and_multiplicatively() {
        let mut analyzer = ContextAnalyzer::new();
        analyzer.register_fn("a", |_: &PlayerContext, _: &AnalyzedContext| {
            Ok(PartialModifiers {
                difficulty_modifier: Some(5.0),
                reward_modifier: Some(2.0),
                event_type_preferences: vec![EventType::Custom("heist".to_string())],
                custom_tags: vec!["outlaw".to_string()],
            })
        });
        analyzer.register_fn("b", |_: &PlayerContext, _: &AnalyzedContext| {
            Ok(PartialModifiers {
                difficulty_modifier: Some(-2.0),
                reward_modifier: Some(1.5),
                ..PartialModifiers::default()
            })
        });

        let raw = PlayerContext::new();
        let mods = analyzer.modifiers(&raw, &analyzer.analyze(&raw));
        assert!((mods.difficulty_modifier - 3.0).abs() < 1e-9);
        assert!((mods.reward_modifier - 3.0).abs() < 1e-9);
        assert_eq!(mods.custom_tags, vec!["outlaw".to_string()]);
        assert_eq!(mods.event_type_preferences.len(), 1);
    }

    #[test]
    fn failing_handlers_are_skipped() {
        let mut analyzer = ContextAnalyzer::new();
        analyzer.register_fn("a_errors", |_: &PlayerContext, _: &AnalyzedContext| {
            Err(HandlerError::Rejected("bad input".to_string()))
        });
        analyzer.register_fn("b_panics", |_: &PlayerContext, _: &AnalyzedContext| {
            if true {
                panic!("handler exploded");
            }
            Ok(PartialModifiers::default())
        });
        analyzer.register_fn("c_works", |_: &PlayerContext, _: &AnalyzedContext| {
            Ok(PartialModifiers {
                custom_tags: vec!["survivor".to_string()],
                ..PartialModifiers::default()
            })
        });

        let raw = PlayerContext::new();
        let mods = analyzer.modifiers(&raw, &analyzer.analyze(&raw));
        assert_eq!(mods.custom_tags, vec!["survivor".to_string()]);
    }

    #[test]
    fn unregister_reports_presence() {
        let mut analyzer = ContextAnalyzer::new();
        analyzer.register_fn("x", |_: &PlayerContext, _: &AnalyzedContext| {
            Ok(PartialModifiers::default())
        });
        assert!(analyzer.unregister_handler("x"));
        assert!(!analyzer.unregister_handler("x"));
        assert_eq!(analyzer.handler_names().count(), 0);
    }
}
