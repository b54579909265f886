/// Generator configuration — tunable probabilities, retry ceilings and
/// model parameters, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Tokens per n-gram state.
    pub state_size: usize,
    /// Random walks attempted per synthesis before the fragment fallback.
    pub markov_max_tries: usize,
    /// Length driver for contextual synthesis.
    pub complexity: usize,
    /// Title/description attempts before the last one is accepted as is.
    pub coherence_attempts: u32,
    /// Chance of splicing an unrecognized attribute's value into a title.
    pub title_literal_chance: f64,
    pub title_suffix_chance: f64,
    /// Chance of appending model text to a description.
    pub continuation_chance: f64,
    /// Appended model text must be at least this long.
    pub min_continuation_length: usize,
    pub contextual_sentence_chance: f64,
    pub thematic_tag_chance: f64,
    pub min_choices: usize,
    pub max_choices: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            state_size: 2,
            markov_max_tries: 10,
            complexity: 30,
            coherence_attempts: 3,
            title_literal_chance: 0.15,
            title_suffix_chance: 0.25,
            continuation_chance: 0.5,
            min_continuation_length: 20,
            contextual_sentence_chance: 0.4,
            thematic_tag_chance: 0.3,
            min_choices: 2,
            max_choices: 4,
        }
    }
}

impl GeneratorConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate. Omitted fields take their defaults.
    pub fn parse_ron(input: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let chances = [
            ("title_literal_chance", self.title_literal_chance),
            ("title_suffix_chance", self.title_suffix_chance),
            ("continuation_chance", self.continuation_chance),
            ("contextual_sentence_chance", self.contextual_sentence_chance),
            ("thematic_tag_chance", self.thematic_tag_chance),
        ];
        for (name, chance) in chances {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, chance
                )));
            }
        }
        if self.state_size == 0 {
            return Err(ConfigError::Invalid("state_size must be at least 1".to_string()));
        }
        if self.coherence_attempts == 0 {
            return Err(ConfigError::Invalid(
                "coherence_attempts must be at least 1".to_string(),
            ));
        }
        if self.min_choices == 0 || self.min_choices > self.max_choices {
            return Err(ConfigError::Invalid(format!(
                "choice bounds {}..={} are invalid",
                self.min_choices, self.max_choices
            )));
        }
        Ok(())
    }
}
