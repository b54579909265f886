/// Curated word tables — the static fallback vocabulary for titles,
/// descriptions, choices and tags, plus the built-in training corpus.

use crate::core::context::{LifeStage, WealthTier};
use crate::schema::event::EventType;

/// Built-in corpus with `[theme]` sections named after event types.
pub const DEFAULT_CORPUS: &str = include_str!("../../genre_data/default/corpus.txt");

/// Descriptions that say nothing; the coherence check rejects them.
pub const GENERIC_PHRASES: &[&str] = &[
    "You find yourself in a strange place.",
    "Something happens.",
    "An event occurs.",
    "You encounter something.",
    "Nothing of note happens.",
    "Something interesting happens.",
];

pub fn adjectives(event_type: &EventType) -> &'static [&'static str] {
    match event_type {
        EventType::Combat => &["Bloody", "Savage", "Desperate", "Brutal", "Sudden"],
        EventType::Economic => &["Lucrative", "Risky", "Golden", "Shrewd", "Costly"],
        EventType::Social => &["Awkward", "Festive", "Tender", "Unexpected", "Lively"],
        EventType::Political => &["Treacherous", "Delicate", "Royal", "Secret", "Bitter"],
        EventType::Exploration => &["Hidden", "Forgotten", "Distant", "Uncharted", "Ancient"],
        EventType::Mystical => &["Eldritch", "Haunted", "Arcane", "Whispering", "Veiled"],
        EventType::Underworld => &["Shadowed", "Crooked", "Silent", "Smuggled", "Dirty"],
        EventType::Personal => &["Quiet", "Painful", "Lingering", "Familiar", "Fateful"],
        EventType::Custom(_) => &["Strange", "Curious", "Unusual", "Peculiar"],
    }
}

pub fn nouns(event_type: &EventType) -> &'static [&'static str] {
    match event_type {
        EventType::Combat => &["Ambush", "Skirmish", "Duel", "Raid", "Siege"],
        EventType::Economic => &["Bargain", "Venture", "Contract", "Debt", "Windfall"],
        EventType::Social => &["Gathering", "Reunion", "Quarrel", "Feast", "Courtship"],
        EventType::Political => &["Summons", "Intrigue", "Accord", "Decree", "Succession"],
        EventType::Exploration => &["Passage", "Ruins", "Expedition", "Frontier", "Cavern"],
        EventType::Mystical => &["Omen", "Ritual", "Apparition", "Prophecy", "Relic"],
        EventType::Underworld => &["Heist", "Racket", "Smuggling", "Vendetta", "Bribe"],
        EventType::Personal => &["Reckoning", "Memory", "Letter", "Promise", "Crossroads"],
        EventType::Custom(_) => &["Encounter", "Happening", "Affair", "Matter"],
    }
}

/// Extra adjectives biased by wealth.
pub fn wealth_adjectives(tier: WealthTier) -> &'static [&'static str] {
    match tier {
        WealthTier::Poor => &["Humble", "Threadbare", "Hungry"],
        WealthTier::Moderate => &["Modest", "Honest"],
        WealthTier::Wealthy => &["Gilded", "Lavish"],
        WealthTier::Rich => &["Opulent", "Jeweled", "Princely"],
    }
}

/// Extra adjectives biased by age.
pub fn life_stage_adjectives(stage: LifeStage) -> &'static [&'static str] {
    match stage {
        LifeStage::Youth => &["Reckless", "Youthful"],
        LifeStage::Adult => &["Bold"],
        LifeStage::Experienced => &["Seasoned", "Weathered"],
        LifeStage::Elder => &["Final", "Twilight", "Venerable"],
    }
}

/// Third-person verb phrases completing "the {noun} ...".
pub fn verb_phrases(event_type: &EventType) -> &'static [&'static str] {
    match event_type {
        EventType::Combat => &[
            "demands steel and nerve",
            "erupts without warning",
            "leaves no room for retreat",
        ],
        EventType::Economic => &[
            "promises coin to the bold",
            "could make or break your fortune",
            "tempts you with easy profit",
        ],
        EventType::Social => &[
            "draws a curious crowd",
            "tests the bonds of friendship",
            "stirs old feelings",
        ],
        EventType::Political => &[
            "shifts the balance of power",
            "requires a careful answer",
            "threatens to split the court",
        ],
        EventType::Exploration => &[
            "beckons from beyond the map",
            "hides secrets older than memory",
            "calls to the curious",
        ],
        EventType::Mystical => &[
            "hums with unseen power",
            "defies every natural law",
            "whispers of things to come",
        ],
        EventType::Underworld => &[
            "unfolds in the shadows",
            "offers profit at a dangerous price",
            "tangles you in criminal business",
        ],
        EventType::Personal => &[
            "weighs heavily on your heart",
            "forces you to look inward",
            "brings the past back to life",
        ],
        EventType::Custom(_) => &["unfolds before you", "demands your attention"],
    }
}

/// Themed clauses occasionally appended to a title.
pub fn title_suffixes(event_type: &EventType) -> &'static [&'static str] {
    match event_type {
        EventType::Combat => &["at Dawn", "Beneath the Banner", "of the Broken Line"],
        EventType::Economic => &["in the Market", "of the Merchant Road"],
        EventType::Social => &["at the Crossroads Inn", "Among Friends"],
        EventType::Political => &["in the High Court", "of the Silver Throne"],
        EventType::Exploration => &["Beyond the Pass", "at the Edge of the Map"],
        EventType::Mystical => &["Under a Pale Moon", "of the Old Gods"],
        EventType::Underworld => &["in the Lower Ward", "After Midnight"],
        EventType::Personal => &["Long Remembered", "by Firelight"],
        EventType::Custom(_) => &["Unforeseen"],
    }
}

const GENERIC_CHOICES: &[&str] = &[
    "Face it head on",
    "Proceed with caution",
    "Look for another way",
    "Walk away",
];

/// Choice texts for an event type; custom types use a generic set.
pub fn choice_templates(event_type: &EventType) -> &'static [&'static str] {
    match event_type {
        EventType::Combat => &[
            "Charge into the fray",
            "Hold your ground and defend",
            "Retreat to safer ground",
            "Try to negotiate a truce",
            "Strike from the flank",
        ],
        EventType::Economic => &[
            "Invest heavily",
            "Make a cautious offer",
            "Walk away from the deal",
            "Haggle for better terms",
            "Gamble on a long shot",
        ],
        EventType::Social => &[
            "Join the conversation",
            "Offer a heartfelt toast",
            "Keep to yourself",
            "Stir up some mischief",
        ],
        EventType::Political => &[
            "Pledge your support",
            "Demand concessions",
            "Stay neutral",
            "Work against them in secret",
        ],
        EventType::Exploration => &[
            "Press onward",
            "Map the area carefully",
            "Search for hidden treasure",
            "Turn back before nightfall",
        ],
        EventType::Mystical => &[
            "Embrace the power",
            "Study it from a distance",
            "Seal it away",
            "Seek a sage's counsel",
        ],
        EventType::Underworld => &[
            "Take the job",
            "Report it to the watch",
            "Ask for a bigger cut",
            "Vanish before anyone notices",
        ],
        EventType::Personal => &[
            "Confront the past",
            "Let it go",
            "Write a letter home",
            "Seek advice from a friend",
        ],
        EventType::Custom(_) => GENERIC_CHOICES,
    }
}

pub fn wealth_sentence(tier: WealthTier) -> &'static str {
    match tier {
        WealthTier::Poor => "Your empty purse weighs on every decision.",
        WealthTier::Moderate => "Your modest savings could make a difference here.",
        WealthTier::Wealthy => "Your wealth has not gone unnoticed.",
        WealthTier::Rich => "Whispers about your vast fortune precede you.",
    }
}

pub fn life_stage_sentence(stage: LifeStage) -> &'static str {
    match stage {
        LifeStage::Youth => "Youth makes you bold, perhaps too bold.",
        LifeStage::Adult => "You are in your prime, and others know it.",
        LifeStage::Experienced => "Years of experience have taught you to read such moments.",
        LifeStage::Elder => "Age has granted you patience that younger folk lack.",
    }
}

pub fn skill_sentence(skill: &str) -> &'static str {
    match skill {
        "combat" => "Your combat training tells you exactly where to strike.",
        "social" => "Your silver tongue could turn this to your advantage.",
        "magic" => "You sense the arcane currents running through this place.",
        "technical" => "Your practiced eye picks out details others would miss.",
        _ => "Your skills may prove useful here.",
    }
}

/// Flavor tags occasionally attached to an event.
pub fn thematic_tags(event_type: &EventType) -> &'static [&'static str] {
    match event_type {
        EventType::Combat => &["danger", "glory", "bloodshed"],
        EventType::Economic => &["opportunity", "greed", "trade"],
        EventType::Social => &["community", "gossip", "celebration"],
        EventType::Political => &["intrigue", "power", "loyalty"],
        EventType::Exploration => &["discovery", "wilderness", "mystery"],
        EventType::Mystical => &["arcane", "omen", "supernatural"],
        EventType::Underworld => &["crime", "secrecy", "betrayal"],
        EventType::Personal => &["reflection", "family", "growth"],
        EventType::Custom(_) => &["unusual"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_vocabulary() {
        let mut types: Vec<EventType> = EventType::BUILTIN.to_vec();
        types.push(EventType::Custom("heist".to_string()));
        for t in &types {
            assert!(!adjectives(t).is_empty());
            assert!(!nouns(t).is_empty());
            assert!(!verb_phrases(t).is_empty());
            assert!(!title_suffixes(t).is_empty());
            assert!(choice_templates(t).len() >= 4, "{} needs 4 choices", t);
            assert!(!thematic_tags(t).is_empty());
        }
    }

    #[test]
    fn custom_types_use_generic_choices() {
        assert_eq!(
            choice_templates(&EventType::Custom("festival".to_string())),
            GENERIC_CHOICES
        );
    }

    #[test]
    fn default_corpus_has_every_builtin_theme() {
        for t in EventType::BUILTIN.iter() {
            let marker = format!("[{}]", t.name());
            assert!(DEFAULT_CORPUS.contains(&marker), "missing {}", marker);
        }
    }
}
