/// N-gram text model — corpus management, transition table, and
/// bounded random-walk generation with a fragment fallback.

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hard ceiling on tokens appended during a single walk.
const WALK_CEILING: usize = 64;
/// Contextual generation prefers entries longer than this for strong players.
const WEIGHTY_ENTRY_LEN: usize = 20;
const WEIGHTY_POWER_LEVEL: u8 = 50;
const SENTENCE_ENDERS: &[char] = &['.', '!', '?'];

/// Window of tokens → observed successors. Duplicates encode frequency.
pub type TransitionTable = BTreeMap<String, Vec<String>>;

/// A training sentence, optionally tagged with a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub text: String,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStats {
    pub state_count: usize,
    pub total_transitions: usize,
}

/// Parameters for theme- and power-aware generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextualRequest<'a> {
    pub theme: Option<&'a str>,
    pub power_level: u8,
    /// Drives the length window: `[max(15, c), min(100, 2c)]`.
    pub complexity: usize,
    pub max_tries: usize,
}

impl Default for ContextualRequest<'_> {
    fn default() -> Self {
        Self {
            theme: None,
            power_level: 0,
            complexity: 30,
            max_tries: 10,
        }
    }
}

impl ContextualRequest<'_> {
    pub fn length_bounds(&self) -> (usize, usize) {
        let min = self.complexity.max(15);
        let max = self.complexity.saturating_mul(2).min(100);
        (min, max)
    }
}

/// A word-level n-gram model over a themed corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextModel {
    /// Number of tokens per state.
    state_size: usize,
    corpus: Vec<CorpusEntry>,
    /// Theme → positions into `corpus`.
    theme_index: FxHashMap<String, Vec<usize>>,
    transitions: TransitionTable,
}

impl Default for TextModel {
    fn default() -> Self {
        Self::new(2)
    }
}

impl TextModel {
    /// A model with the given window size (clamped to at least 1).
    pub fn new(state_size: usize) -> Self {
        Self {
            state_size: state_size.max(1),
            corpus: Vec::new(),
            theme_index: FxHashMap::default(),
            transitions: TransitionTable::new(),
        }
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn corpus(&self) -> &[CorpusEntry] {
        &self.corpus
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn is_trained(&self) -> bool {
        !self.transitions.is_empty()
    }

    pub fn themes(&self) -> impl Iterator<Item = &str> {
        self.theme_index.keys().map(|t| t.as_str())
    }

    /// Append sentences and rebuild the transition table from scratch.
    pub fn add_corpus<S: AsRef<str>>(&mut self, sentences: &[S], theme: Option<&str>) {
        let theme = theme.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty());
        for sentence in sentences {
            let text = sentence.as_ref().trim();
            if text.is_empty() {
                continue;
            }
            if let Some(ref t) = theme {
                self.theme_index
                    .entry(t.clone())
                    .or_default()
                    .push(self.corpus.len());
            }
            self.corpus.push(CorpusEntry {
                text: text.to_string(),
                theme: theme.clone(),
            });
        }
        self.rebuild();
        tracing::info!(
            "corpus now {} entries, {} states",
            self.corpus.len(),
            self.transitions.len()
        );
    }

    /// Ingest corpus text with `[theme]` section markers. Each non-empty
    /// line is one sentence; lines before any marker are untagged.
    pub fn add_tagged_text(&mut self, text: &str) {
        let mut sections: Vec<(Option<String>, Vec<&str>)> = vec![(None, Vec::new())];

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() > 2 {
                let tag = &trimmed[1..trimmed.len() - 1];
                sections.push((Some(tag.to_string()), Vec::new()));
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some((_, lines)) = sections.last_mut() {
                lines.push(trimmed);
            }
        }

        for (theme, lines) in sections {
            if !lines.is_empty() {
                self.add_corpus(&lines, theme.as_deref());
            }
        }
    }

    fn rebuild(&mut self) {
        self.transitions = build_table(self.corpus.iter().map(|e| e.text.as_str()), self.state_size);
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            state_count: self.transitions.len(),
            total_transitions: self.transitions.values().map(|bag| bag.len()).sum(),
        }
    }

    /// Generate a string whose length lies in `[min_len, max_len]`, trying
    /// up to `max_tries` walks before falling back to raw corpus fragments.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        min_len: usize,
        max_len: usize,
        max_tries: usize,
    ) -> String {
        let pool: Vec<&str> = self.corpus.iter().map(|e| e.text.as_str()).collect();
        synthesize(
            &self.transitions,
            self.state_size,
            &pool,
            rng,
            min_len,
            max_len,
            max_tries,
        )
    }

    /// Generate from the entries matching a theme (or all entries), biased
    /// toward longer source sentences for powerful characters.
    pub fn generate_contextual<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        request: &ContextualRequest<'_>,
    ) -> String {
        let themed: Option<Vec<&str>> = request
            .theme
            .map(|t| t.trim().to_lowercase())
            .and_then(|t| self.theme_index.get(&t))
            .filter(|positions| !positions.is_empty())
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| self.corpus[i].text.as_str())
                    .collect()
            });
        let mut filtered = themed.is_some();
        let mut working =
            themed.unwrap_or_else(|| self.corpus.iter().map(|e| e.text.as_str()).collect());

        if request.power_level > WEIGHTY_POWER_LEVEL {
            let weighty: Vec<&str> = working
                .iter()
                .copied()
                .filter(|s| s.chars().count() > WEIGHTY_ENTRY_LEN)
                .collect();
            if !weighty.is_empty() && weighty.len() < working.len() {
                working = weighty;
                filtered = true;
            }
        }

        let (min_len, max_len) = request.length_bounds();
        // The unfiltered corpus already has its table in `self.transitions`.
        let local;
        let table = if filtered {
            local = build_table(working.iter().copied(), self.state_size);
            &local
        } else {
            &self.transitions
        };
        synthesize(
            table,
            self.state_size,
            &working,
            rng,
            min_len,
            max_len,
            request.max_tries,
        )
    }
}

/// Build a transition table from sentences, tokenized on whitespace.
pub fn build_table<'a, I>(sentences: I, state_size: usize) -> TransitionTable
where
    I: IntoIterator<Item = &'a str>,
{
    let mut table = TransitionTable::new();
    for sentence in sentences {
        let tokens: Vec<&str> = sentence.split_whitespace().collect();
        if tokens.len() <= state_size {
            continue;
        }
        for window in tokens.windows(state_size + 1) {
            let state = window[..state_size].join(" ");
            table
                .entry(state)
                .or_default()
                .push(window[state_size].to_string());
        }
    }
    table
}

fn synthesize<R: Rng + ?Sized>(
    table: &TransitionTable,
    state_size: usize,
    fallback_pool: &[&str],
    rng: &mut R,
    min_len: usize,
    max_len: usize,
    max_tries: usize,
) -> String {
    if !table.is_empty() {
        let states: Vec<&String> = table.keys().collect();
        for attempt in 0..max_tries {
            let candidate = finish_sentence(&walk(table, &states, state_size, rng, max_len));
            let len = candidate.chars().count();
            if (min_len..=max_len).contains(&len) {
                return candidate;
            }
            tracing::trace!("walk {} rejected at length {}", attempt, len);
        }
    }
    tracing::debug!("n-gram walk exhausted; joining corpus fragments");
    fragment_fallback(fallback_pool, rng)
}

/// One random walk from a uniformly chosen state.
fn walk<R: Rng + ?Sized>(
    table: &TransitionTable,
    states: &[&String],
    state_size: usize,
    rng: &mut R,
    max_len: usize,
) -> String {
    let Some(seed) = states.choose(rng) else {
        return String::new();
    };
    let mut words: Vec<&str> = seed.split(' ').collect();
    let mut length = seed.chars().count();

    for _ in 0..WALK_CEILING {
        if length >= max_len {
            break;
        }
        let key = words[words.len().saturating_sub(state_size)..].join(" ");
        let bag = match table.get(&key) {
            Some(bag) => bag,
            None => match resume_from_last_token(table, states, &words, rng) {
                Some(bag) => bag,
                None => break,
            },
        };
        let Some(next) = bag.choose(rng) else {
            break;
        };
        // Leave room for the space and a closing punctuation mark.
        if length + 1 + next.chars().count() + 1 > max_len {
            break;
        }
        length += 1 + next.chars().count();
        words.push(next.as_str());
    }

    words.join(" ")
}

/// Successor bag of a random state starting with the walk's last token.
fn resume_from_last_token<'t, R: Rng + ?Sized>(
    table: &'t TransitionTable,
    states: &[&String],
    words: &[&str],
    rng: &mut R,
) -> Option<&'t Vec<String>> {
    let last = words.last()?;
    let candidates: Vec<&&String> = states
        .iter()
        .filter(|s| s.split(' ').next() == Some(*last))
        .collect();
    let state = candidates.choose(rng)?;
    table.get(state.as_str())
}

/// Capitalize the first character and make sure the text ends with
/// sentence punctuation.
pub fn finish_sentence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut chars = trimmed.chars();
    let mut out: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    if !out.ends_with(SENTENCE_ENDERS) {
        let stripped_len = out.trim_end_matches([',', ';', ':']).len();
        out.truncate(stripped_len);
        out.push('.');
    }
    out
}

/// Two or three raw corpus sentences joined by ". ". Empty pool gives "".
fn fragment_fallback<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> String {
    if pool.is_empty() {
        return String::new();
    }
    let count = rng.gen_range(2..=3).min(pool.len());
    pool.choose_multiple(rng, count)
        .copied()
        .collect::<Vec<_>>()
        .join(". ")
}
