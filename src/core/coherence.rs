/// Coherence check — does a description plausibly belong to its title?

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::vocabulary::GENERIC_PHRASES;

/// Descriptions shorter than this are rejected.
pub const MIN_DESCRIPTION_LEN: usize = 20;
/// Words of this length or shorter are not content words.
const CONTENT_WORD_MIN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoherenceIssue {
    #[error("description shares no content word with the title")]
    NoSharedVocabulary,
    #[error("description is generic filler")]
    GenericPhrase,
    #[error("description is only {0} characters")]
    TooShort(usize),
}

/// Lowercased words of at least four characters. Words split on anything
/// but letters, digits and apostrophes; outer apostrophes are trimmed.
pub fn content_words(text: &str) -> FxHashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() >= CONTENT_WORD_MIN)
        .collect()
}

pub fn is_generic(description: &str) -> bool {
    let normalized = description.trim().to_lowercase();
    GENERIC_PHRASES
        .iter()
        .any(|p| p.to_lowercase() == normalized)
}

/// Check a title/description pair. Vocabulary overlap is only required
/// when the title has at least two content words.
pub fn check(title: &str, description: &str) -> Result<(), CoherenceIssue> {
    let title_words = content_words(title);
    if title_words.len() > 1 {
        let description_words = content_words(description);
        if title_words.is_disjoint(&description_words) {
            return Err(CoherenceIssue::NoSharedVocabulary);
        }
    }

    if is_generic(description) {
        return Err(CoherenceIssue::GenericPhrase);
    }

    let len = description.trim().chars().count();
    if len < MIN_DESCRIPTION_LEN {
        return Err(CoherenceIssue::TooShort(len));
    }

    Ok(())
}
