//! WASM bindings for event-weaver — JSON in, JSON out.

use wasm_bindgen::prelude::*;

use event_weaver::core::difficulty::DifficultyTier;
use event_weaver::core::pipeline::EventGenerator;
use event_weaver::schema::event::EventType;
use event_weaver::schema::player::PlayerContext;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
struct TierInput {
    #[serde(default)]
    name: String,
    #[serde(default)]
    power_range: Vec<i32>,
    #[serde(default = "unit_multiplier")]
    reward_multiplier: f64,
    #[serde(default = "unit_multiplier")]
    penalty_multiplier: f64,
}

fn unit_multiplier() -> f64 {
    1.0
}

/// An empty or whitespace-only string is the empty context.
fn parse_context(context_json: &str) -> Result<PlayerContext, JsError> {
    if context_json.trim().is_empty() {
        return Ok(PlayerContext::default());
    }
    serde_json::from_str(context_json)
        .map_err(|e| JsError::new(&format!("Invalid context JSON: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn build_generator(seed: u64) -> Result<EventGenerator, JsError> {
    EventGenerator::builder()
        .seed(seed)
        .with_default_corpus()
        .build()
        .map_err(|e| JsError::new(&format!("Generator build error: {e}")))
}

// ---------------------------------------------------------------------------
// EventDemo — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct EventDemo {
    generator: EventGenerator,
}

#[wasm_bindgen]
impl EventDemo {
    /// Create a generator trained on the built-in corpus.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<EventDemo, JsError> {
        Ok(EventDemo {
            generator: build_generator(seed)?,
        })
    }

    /// Generate one event for a player context given as a flat JSON object,
    /// e.g. `{"level": 12, "gold": 4000, "career": "merchant", "stealth": 40}`.
    pub fn generate(&mut self, context_json: &str) -> Result<String, JsError> {
        let context = parse_context(context_json)?;
        to_json(&self.generator.generate_event(&context))
    }

    /// Generate `count` events. Returns a JSON array.
    pub fn generate_many(&mut self, context_json: &str, count: usize) -> Result<String, JsError> {
        let context = parse_context(context_json)?;
        to_json(&self.generator.generate_events(&context, count))
    }

    /// The analyzed profile for a context.
    pub fn analyze(&self, context_json: &str) -> Result<String, JsError> {
        let context = parse_context(context_json)?;
        to_json(&self.generator.analyze_context(&context))
    }

    pub fn power_level(&self, context_json: &str) -> Result<u8, JsError> {
        let context = parse_context(context_json)?;
        Ok(self.generator.calculate_power_level(&context))
    }

    pub fn tier_for(&self, power_level: i32) -> Result<String, JsError> {
        to_json(&self.generator.calculate_difficulty_tier(power_level))
    }

    /// JSON array of the configured tiers, sorted by lower bound.
    pub fn tiers(&self) -> Result<String, JsError> {
        to_json(&self.generator.scaler().tiers())
    }

    /// Add or replace a tier from
    /// `{"name": "mythic", "power_range": [90, 150], "reward_multiplier": 3.0}`.
    pub fn add_tier(&mut self, tier_json: &str) -> Result<(), JsError> {
        let input: TierInput = serde_json::from_str(tier_json)
            .map_err(|e| JsError::new(&format!("Invalid tier JSON: {e}")))?;
        let tier = DifficultyTier::from_parts(
            &input.name,
            &input.power_range,
            input.reward_multiplier,
            input.penalty_multiplier,
        )
        .map_err(|e| JsError::new(&format!("Invalid tier: {e}")))?;
        self.generator
            .add_difficulty_tier(tier)
            .map_err(|e| JsError::new(&format!("Invalid tier: {e}")))
    }

    pub fn remove_tier(&mut self, name: &str) -> bool {
        self.generator.remove_difficulty_tier(name)
    }

    /// Train on a JSON array of sentences, optionally under a theme.
    pub fn add_corpus(&mut self, sentences_json: &str, theme: Option<String>) -> Result<(), JsError> {
        let sentences: Vec<String> = serde_json::from_str(sentences_json)
            .map_err(|e| JsError::new(&format!("Invalid corpus JSON: {e}")))?;
        self.generator.add_corpus(&sentences, theme.as_deref());
        Ok(())
    }

    /// Train on plain text with `[theme]` section markers.
    pub fn add_tagged_corpus(&mut self, text: &str) {
        self.generator.add_tagged_corpus(text);
    }

    /// `{"state_count": .., "total_transitions": ..}`
    pub fn corpus_stats(&self) -> Result<String, JsError> {
        to_json(&self.generator.model().stats())
    }

    /// Return JSON array of built-in event type names.
    pub fn event_types() -> String {
        serde_json::to_string(&EventType::BUILTIN.iter().map(|t| t.name()).collect::<Vec<_>>())
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Rebuild with a new seed. Added corpus text and tiers are discarded.
    pub fn reset(&mut self, seed: u64) -> Result<(), JsError> {
        self.generator = build_generator(seed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_context_is_default() {
        assert!(parse_context("  ").is_ok());
    }

    #[test]
    fn event_types_lists_builtins() {
        let names: Vec<String> = serde_json::from_str(&EventDemo::event_types()).unwrap();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "combat");
    }

    #[test]
    fn tier_input_defaults_multipliers() {
        let input: TierInput =
            serde_json::from_str(r#"{"name": "mythic", "power_range": [90, 150]}"#).unwrap();
        assert_eq!(input.reward_multiplier, 1.0);
        assert_eq!(input.power_range, vec![90, 150]);
    }
}
