/// Choice effects — per-event-type stat profiles and choice assembly.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::difficulty::DifficultyTier;
use crate::core::vocabulary;
use crate::schema::event::{Choice, Effect, EffectValue, EventType};

/// One stat a profile may touch: rolled uniformly in `min..=max` with
/// probability `chance`.
#[derive(Debug, Clone, Copy)]
struct StatRoll {
    stat: &'static str,
    min: i64,
    max: i64,
    chance: f64,
}

const fn roll(stat: &'static str, min: i64, max: i64, chance: f64) -> StatRoll {
    StatRoll {
        stat,
        min,
        max,
        chance,
    }
}

#[derive(Debug, Clone, Copy)]
struct EffectProfile {
    /// The first roll is the headline stat and is always present.
    rolls: &'static [StatRoll],
    /// Chance the headline stat is an uncertain `[min, max]` outcome.
    range_chance: f64,
}

const COMBAT_ROLLS: &[StatRoll] = &[
    roll("health", -20, -5, 1.0),
    roll("gold", 10, 50, 0.3),
    roll("experience", 5, 15, 0.6),
];

const ECONOMIC_ROLLS: &[StatRoll] = &[roll("gold", -40, 60, 1.0), roll("influence", 1, 5, 0.3)];

const SOCIAL_ROLLS: &[StatRoll] = &[
    roll("reputation", -5, 10, 1.0),
    roll("influence", 0, 5, 0.5),
    roll("health", 1, 5, 0.2),
];

const POLITICAL_ROLLS: &[StatRoll] = &[
    roll("influence", -10, 15, 1.0),
    roll("reputation", -5, 10, 0.5),
    roll("gold", -30, 20, 0.3),
];

const EXPLORATION_ROLLS: &[StatRoll] = &[
    roll("experience", 5, 20, 1.0),
    roll("health", -15, 0, 0.5),
    roll("gold", 0, 40, 0.4),
];

const MYSTICAL_ROLLS: &[StatRoll] = &[
    roll("health", -20, 10, 1.0),
    roll("experience", 5, 15, 0.6),
    roll("insight", 1, 10, 0.4),
];

const UNDERWORLD_ROLLS: &[StatRoll] = &[
    roll("gold", 20, 80, 1.0),
    roll("reputation", -15, -2, 0.7),
    roll("health", -10, 0, 0.3),
];

const PERSONAL_ROLLS: &[StatRoll] = &[
    roll("experience", 2, 8, 1.0),
    roll("health", -5, 10, 0.5),
    roll("reputation", 0, 5, 0.3),
];

const CUSTOM_ROLLS: &[StatRoll] = &[roll("gold", -10, 10, 1.0), roll("reputation", -5, 5, 0.5)];

fn profile(event_type: &EventType) -> EffectProfile {
    match event_type {
        EventType::Combat => EffectProfile {
            rolls: COMBAT_ROLLS,
            range_chance: 0.0,
        },
        EventType::Economic => EffectProfile {
            rolls: ECONOMIC_ROLLS,
            range_chance: 0.25,
        },
        EventType::Social => EffectProfile {
            rolls: SOCIAL_ROLLS,
            range_chance: 0.0,
        },
        EventType::Political => EffectProfile {
            rolls: POLITICAL_ROLLS,
            range_chance: 0.1,
        },
        EventType::Exploration => EffectProfile {
            rolls: EXPLORATION_ROLLS,
            range_chance: 0.0,
        },
        EventType::Mystical => EffectProfile {
            rolls: MYSTICAL_ROLLS,
            range_chance: 0.2,
        },
        EventType::Underworld => EffectProfile {
            rolls: UNDERWORLD_ROLLS,
            range_chance: 0.0,
        },
        EventType::Personal => EffectProfile {
            rolls: PERSONAL_ROLLS,
            range_chance: 0.0,
        },
        EventType::Custom(_) => EffectProfile {
            rolls: CUSTOM_ROLLS,
            range_chance: 0.0,
        },
    }
}

/// Roll an unscaled effect for one choice.
pub fn roll_effect<R: Rng + ?Sized>(event_type: &EventType, rng: &mut R) -> Effect {
    let profile = profile(event_type);
    let mut effect = Effect::new();

    for (i, r) in profile.rolls.iter().enumerate() {
        let headline = i == 0;
        if !headline && !rng.gen_bool(r.chance) {
            continue;
        }
        let value = if headline && profile.range_chance > 0.0 && rng.gen_bool(profile.range_chance)
        {
            EffectValue::Range([r.min, r.max])
        } else {
            EffectValue::Amount(rng.gen_range(r.min..=r.max))
        };
        effect.insert(r.stat.to_string(), value);
    }

    effect
}

/// Multiply non-negative amounts (and non-negative range bounds) by a
/// context reward modifier, rounding to the nearest integer.
pub fn apply_reward_modifier(effect: &Effect, modifier: f64) -> Effect {
    if !modifier.is_finite() || modifier < 0.0 || (modifier - 1.0).abs() < f64::EPSILON {
        return effect.clone();
    }
    let boost = |v: i64| {
        if v >= 0 {
            (v as f64 * modifier).round() as i64
        } else {
            v
        }
    };
    effect
        .iter()
        .map(|(stat, value)| {
            let boosted = match value {
                EffectValue::Amount(v) => EffectValue::Amount(boost(*v)),
                EffectValue::Range([min, max]) => EffectValue::Range([boost(*min), boost(*max)]),
                other => other.clone(),
            };
            (stat.clone(), boosted)
        })
        .collect()
}

/// Pick `count` distinct choice texts for the event type and give each a
/// rolled, modifier-boosted, tier-scaled effect.
pub fn build_choices<R: Rng + ?Sized>(
    event_type: &EventType,
    count: usize,
    tier: &DifficultyTier,
    reward_modifier: f64,
    rng: &mut R,
) -> Vec<Choice> {
    let templates = vocabulary::choice_templates(event_type);
    templates
        .choose_multiple(rng, count.min(templates.len()))
        .map(|text| text.to_string())
        .collect::<Vec<_>>()
        .into_iter()
        .map(|text| {
            let effect = apply_reward_modifier(&roll_effect(event_type, rng), reward_modifier);
            Choice {
                text,
                effects: tier.scale_effect(&effect),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn combat_always_costs_health() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let effect = roll_effect(&EventType::Combat, &mut rng);
            match effect.get("health") {
                Some(EffectValue::Amount(v)) => assert!((-20..=-5).contains(v)),
                other => panic!("expected health amount, got {:?}", other),
            }
        }
    }

    #[test]
    fn economic_gold_goes_both_ways() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut gains = 0;
        let mut losses = 0;
        let mut ranges = 0;
        for _ in 0..300 {
            match roll_effect(&EventType::Economic, &mut rng).get("gold") {
                Some(EffectValue::Amount(v)) if *v >= 0 => gains += 1,
                Some(EffectValue::Amount(_)) => losses += 1,
                Some(EffectValue::Range([min, max])) => {
                    assert_eq!((*min, *max), (-40, 60));
                    ranges += 1;
                }
                other => panic!("unexpected gold value {:?}", other),
            }
        }
        assert!(gains > 0 && losses > 0 && ranges > 0);
    }

    #[test]
    fn reward_modifier_boosts_only_rewards() {
        let mut effect = Effect::new();
        effect.insert("gold".to_string(), EffectValue::Amount(10));
        effect.insert("health".to_string(), EffectValue::Amount(-10));
        effect.insert("luck".to_string(), EffectValue::Range([-4, 4]));
        effect.insert("note".to_string(), EffectValue::Text("blessed".to_string()));
        let boosted = apply_reward_modifier(&effect, 1.5);
        assert_eq!(boosted["gold"], EffectValue::Amount(15));
        assert_eq!(boosted["health"], EffectValue::Amount(-10));
        assert_eq!(boosted["luck"], EffectValue::Range([-4, 6]));
        assert_eq!(boosted["note"], EffectValue::Text("blessed".to_string()));
    }

    #[test]
    fn choices_are_distinct_and_scaled() {
        let mut rng = StdRng::seed_from_u64(3);
        let tier = DifficultyTier::new("brutal", 0, 100, 1.0, 3.0);
        let choices = build_choices(&EventType::Combat, 4, &tier, 1.0, &mut rng);
        assert_eq!(choices.len(), 4);
        let mut texts: Vec<&str> = choices.iter().map(|c| c.text.as_str()).collect();
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), 4);
        for choice in &choices {
            match choice.effects.get("health") {
                Some(EffectValue::Amount(v)) => assert!((-60..=-15).contains(v)),
                other => panic!("expected scaled health, got {:?}", other),
            }
        }
    }

    #[test]
    fn every_profile_has_a_sure_headline() {
        let mut types: Vec<EventType> = EventType::BUILTIN.to_vec();
        types.push(EventType::Custom("heist".into()));
        let mut rng = StdRng::seed_from_u64(5);
        for t in &types {
            let rolls = profile(t).rolls;
            assert_eq!(rolls[0].chance, 1.0, "{} headline", t);
            assert!(rolls.iter().all(|r| r.min <= r.max));
            assert!(roll_effect(t, &mut rng).contains_key(rolls[0].stat));
        }
    }

    #[test]
    fn custom_types_get_generic_choices() {
        let mut rng = StdRng::seed_from_u64(4);
        let tier = DifficultyTier::new("normal", 0, 100, 1.0, 1.0);
        let choices = build_choices(&EventType::Custom("heist".into()), 3, &tier, 1.0, &mut rng);
        assert_eq!(choices.len(), 3);
        assert!(choices.iter().all(|c| c.effects.contains_key("gold")));
    }
}
