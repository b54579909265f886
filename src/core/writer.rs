/// Title and description writing — model-driven with curated fallbacks.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::core::config::GeneratorConfig;
use crate::core::context::{AnalyzedContext, LifeStage, WealthTier};
use crate::core::difficulty::DifficultyTier;
use crate::core::markov::{ContextualRequest, TextModel};
use crate::core::vocabulary;
use crate::schema::event::EventType;
use crate::schema::player::PlayerContext;

/// Model tokens must be longer than this to become title words.
const TITLE_WORD_MIN: usize = 4;

/// Long but contentless words that make poor title words.
const TITLE_STOPWORDS: &[&str] = &[
    "about", "after", "again", "before", "been", "every", "from", "have", "into", "over",
    "somewhere", "than", "that", "their", "them", "then", "there", "they", "this", "twice",
    "were", "when", "whenever", "where", "which", "while", "with", "your",
];

/// Everything a writer may draw on for one event.
pub struct WriteRequest<'a> {
    pub context: &'a PlayerContext,
    pub analyzed: &'a AnalyzedContext,
    pub event_type: &'a EventType,
    pub tier: &'a DifficultyTier,
    pub model: &'a TextModel,
    pub config: &'a GeneratorConfig,
}

impl WriteRequest<'_> {
    fn contextual(&self) -> ContextualRequest<'_> {
        ContextualRequest {
            theme: Some(self.event_type.name()),
            power_level: self.analyzed.power_level,
            complexity: self.config.complexity,
            max_tries: self.config.markov_max_tries,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub text: String,
    pub adjective: String,
    pub noun: String,
}

/// Produces titles and descriptions. Swappable so hosts and tests can
/// control the text side of the pipeline.
pub trait EventWriter: Send + Sync {
    fn title(&self, request: &WriteRequest<'_>, rng: &mut dyn RngCore) -> Title;
    fn describe(&self, request: &WriteRequest<'_>, title: &Title, rng: &mut dyn RngCore)
        -> String;
}

/// The default writer: model words when the model has them, curated
/// tables otherwise, dressed in fixed sentence frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateWriter;

impl TemplateWriter {
    /// Adjective and noun from the first two usable model tokens.
    fn model_words(
        &self,
        request: &WriteRequest<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<(String, String)> {
        if !request.model.is_trained() {
            return None;
        }
        let text = request
            .model
            .generate_contextual(rng, &request.contextual());
        let mut usable = text
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphabetic()))
            .filter(|t| {
                t.chars().count() >= TITLE_WORD_MIN
                    && t.chars().all(char::is_alphabetic)
                    && !TITLE_STOPWORDS.contains(&t.to_lowercase().as_str())
            });
        let adjective = capitalize(usable.next()?);
        let noun = capitalize(usable.next()?);
        Some((adjective, noun))
    }

    /// Adjective and noun from the curated tables, biased by wealth and age.
    fn table_words(&self, request: &WriteRequest<'_>, rng: &mut dyn RngCore) -> (String, String) {
        let mut adjectives: Vec<&str> = vocabulary::adjectives(request.event_type).to_vec();
        adjectives.extend(vocabulary::wealth_adjectives(request.analyzed.wealth_tier));
        adjectives.extend(vocabulary::life_stage_adjectives(request.analyzed.life_stage));

        let adjective = adjectives.choose(rng).copied().unwrap_or("Strange");
        let noun = vocabulary::nouns(request.event_type)
            .choose(rng)
            .copied()
            .unwrap_or("Encounter");
        (adjective.to_string(), noun.to_string())
    }
}

impl EventWriter for TemplateWriter {
    fn title(&self, request: &WriteRequest<'_>, rng: &mut dyn RngCore) -> Title {
        let (adjective, noun) = match self.model_words(request, rng) {
            Some(words) => words,
            None => {
                tracing::debug!("model gave no title words; using curated tables");
                self.table_words(request, rng)
            }
        };

        let mut text = format!("The {} {}", adjective, noun);
        if rng.gen_bool(request.config.title_literal_chance) {
            if let Some(literal) = pick_literal(request.context, rng) {
                text = format!("{} of {}", text, literal);
            }
        }
        if rng.gen_bool(request.config.title_suffix_chance) {
            if let Some(suffix) = vocabulary::title_suffixes(request.event_type).choose(rng) {
                text = format!("{} {}", text, suffix);
            }
        }

        Title {
            text,
            adjective,
            noun,
        }
    }

    fn describe(
        &self,
        request: &WriteRequest<'_>,
        title: &Title,
        rng: &mut dyn RngCore,
    ) -> String {
        let adjective = title.adjective.to_lowercase();
        let noun = title.noun.to_lowercase();
        let verb = vocabulary::verb_phrases(request.event_type)
            .choose(rng)
            .copied()
            .unwrap_or("unfolds before you");

        let mut description = match rng.gen_range(0..4) {
            0 => format!("The {} {} {}.", adjective, noun, verb),
            1 => format!(
                "Word spreads of {} {} {} that {}.",
                article(&adjective),
                adjective,
                noun,
                verb
            ),
            2 => format!(
                "Before you lies {} {} {}. It {}.",
                article(&adjective),
                adjective,
                noun,
                verb
            ),
            _ => format!(
                "You come upon the {}, {} and unexpected. It {}.",
                noun, adjective, verb
            ),
        };

        if request.model.is_trained() && rng.gen_bool(request.config.continuation_chance) {
            let continuation = request
                .model
                .generate_contextual(rng, &request.contextual());
            if continuation.chars().count() >= request.config.min_continuation_length {
                description.push(' ');
                description.push_str(&continuation);
            }
        }

        if rng.gen_bool(request.config.contextual_sentence_chance) {
            if let Some(sentence) = contextual_sentence(request, rng) {
                description.push(' ');
                description.push_str(sentence);
            }
        }

        description
    }
}

/// One fixed sentence keyed on a non-default wealth tier, a non-default
/// life stage, or a strong skill matching the event type.
fn contextual_sentence(request: &WriteRequest<'_>, rng: &mut dyn RngCore) -> Option<&'static str> {
    let analyzed = request.analyzed;
    let mut candidates = Vec::new();

    if analyzed.wealth_tier != WealthTier::from_gold(PlayerContext::DEFAULTS.gold) {
        candidates.push(vocabulary::wealth_sentence(analyzed.wealth_tier));
    }
    if analyzed.life_stage != LifeStage::from_age(PlayerContext::DEFAULTS.age) {
        candidates.push(vocabulary::life_stage_sentence(analyzed.life_stage));
    }
    if let Some((skill, value)) = analyzed.skill_profile.for_event_type(request.event_type) {
        if value >= 60 {
            candidates.push(vocabulary::skill_sentence(skill));
        }
    }

    candidates.choose(rng).copied()
}

/// A literal value from a random attribute the engine does not model.
fn pick_literal(context: &PlayerContext, rng: &mut dyn RngCore) -> Option<String> {
    let literals: Vec<String> = context
        .extras
        .values()
        .filter_map(|v| v.as_literal())
        .collect();
    literals.choose(rng).cloned()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some(c) if "aeiou".contains(c) => "an",
        _ => "a",
    }
}
