/// Frontier Campaign example — one character's rise told through events.
///
/// A short arc: penniless drifter → hired blade → frontier captain → warlord.
/// Each chapter feeds a stronger player context to the same generator, so the
/// difficulty tier climbs and the effects scale with it.
///
/// Run with: cargo run --example frontier_campaign

use event_weaver::core::pipeline::EventGenerator;
use event_weaver::schema::event::{EffectValue, Event};
use event_weaver::schema::player::PlayerContext;

const FRONTIER_LORE: &str = "\
[exploration]
The frontier road winds past burned homesteads and silent watchtowers.
Scouts return from the badlands with tales of a buried city under the dunes.
[combat]
Raiders from the salt flats strike the caravan at first light.
";

fn main() {
    let mut generator = EventGenerator::builder()
        .seed(1849)
        .with_default_corpus()
        .with_tagged_corpus(FRONTIER_LORE)
        .build()
        .expect("Failed to build event generator");

    let chapters = [
        (
            "Drifter",
            PlayerContext::new()
                .with_level(1.0)
                .with_gold(5.0)
                .with_health(60.0)
                .with_career("drifter"),
        ),
        (
            "Hired Blade",
            PlayerContext::new()
                .with_level(6.0)
                .with_gold(400.0)
                .with_influence(15.0)
                .with_career("mercenary")
                .with_skill("swordsmanship", 40.0),
        ),
        (
            "Frontier Captain",
            PlayerContext::new()
                .with_level(12.0)
                .with_gold(8_000.0)
                .with_influence(55.0)
                .with_reputation(30.0)
                .with_career("captain"),
        ),
        (
            "Warlord",
            PlayerContext::new()
                .with_level(20.0)
                .with_gold(1_000_000.0)
                .with_influence(100.0)
                .with_health(100.0)
                .with_career("warlord"),
        ),
    ];

    for (name, context) in &chapters {
        let power = generator.calculate_power_level(context);
        let tier = generator.calculate_difficulty_tier(i32::from(power));
        println!("########## {} (power {}, {}) ##########\n", name, power, tier.name);

        for event in generator.generate_events(context, 2) {
            print_event(&event);
        }
    }
}

fn print_event(event: &Event) {
    println!("== {} == [{}]", event.title, event.event_type);
    println!("{}", event.description);
    for (i, choice) in event.choices.iter().enumerate() {
        let effects: Vec<String> = choice
            .effects
            .iter()
            .map(|(stat, value)| format!("{} {}", stat, describe(value)))
            .collect();
        println!("  {}. {} ({})", i + 1, choice.text, effects.join(", "));
    }
    if !event.tags.is_empty() {
        println!("  tags: {}", event.tags.join(" "));
    }
    println!();
}

fn describe(value: &EffectValue) -> String {
    match value {
        EffectValue::Amount(v) => format!("{:+}", v),
        EffectValue::Range([min, max]) => format!("{:+}..{:+}", min, max),
        EffectValue::Flag(b) => b.to_string(),
        EffectValue::Text(t) => t.clone(),
    }
}
