/// Event Preview — generate events for a player context described by flags.
///
/// Usage: event_preview [--level <n>] [--gold <n>] [--influence <n>] [--health <n>]
///                      [--age <n>] [--reputation <n>] [--career <name>]
///                      [--skill <name=value>]... [--attr <key=value>]...
///                      [--count <n>] [--seed <n>] [--config <config.ron>]
///                      [--tiers <tiers.ron>] [--corpus <corpus.txt>]
///                      [--no-default-corpus] [--ron]
use event_weaver::core::pipeline::EventGenerator;
use event_weaver::schema::event::{EffectValue, Event};
use event_weaver::schema::player::{AttributeValue, PlayerContext};
use std::env;
use std::process;

const USAGE: &str = "Usage: event_preview [--level <n>] [--gold <n>] [--influence <n>] \
[--health <n>] [--age <n>] [--reputation <n>] [--career <name>] [--skill <name=value>]... \
[--attr <key=value>]... [--count <n>] [--seed <n>] [--config <config.ron>] \
[--tiers <tiers.ron>] [--corpus <corpus.txt>] [--no-default-corpus] [--ron]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut context = PlayerContext::new();
    let mut count = 1usize;
    let mut seed = None;
    let mut config_path = None;
    let mut tiers_path = None;
    let mut corpus_path = None;
    let mut default_corpus = true;
    let mut as_ron = false;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let takes_value = !matches!(flag, "--no-default-corpus" | "--ron" | "--help" | "-h");
        let value = if takes_value {
            i += 1;
            match args.get(i) {
                Some(v) => v.clone(),
                None => fail(&format!("{} needs a value", flag)),
            }
        } else {
            String::new()
        };

        match flag {
            "--level" => context.level = Some(number(flag, &value)),
            "--gold" => context.gold = Some(number(flag, &value)),
            "--influence" => context.influence = Some(number(flag, &value)),
            "--health" => context.health = Some(number(flag, &value)),
            "--age" => context.age = Some(number(flag, &value)),
            "--reputation" => context.reputation = Some(number(flag, &value)),
            "--career" => context.career = Some(value),
            "--skill" => {
                let (name, raw) = pair(flag, &value);
                context.skills.insert(name, number(flag, &raw));
            }
            "--attr" => {
                let (key, raw) = pair(flag, &value);
                context.extras.insert(key, attribute(&raw));
            }
            "--count" => count = value.parse().unwrap_or_else(|_| fail("--count must be a number")),
            "--seed" => seed = Some(value.parse().unwrap_or_else(|_| fail("--seed must be a number"))),
            "--config" => config_path = Some(value),
            "--tiers" => tiers_path = Some(value),
            "--corpus" => corpus_path = Some(value),
            "--no-default-corpus" => default_corpus = false,
            "--ron" => as_ron = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => fail(&format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    let mut builder = EventGenerator::builder();
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    if let Some(ref path) = config_path {
        builder = builder.config_file(path);
    }
    if let Some(ref path) = tiers_path {
        builder = builder.tiers_file(path);
    }
    if default_corpus {
        builder = builder.with_default_corpus();
    }
    if let Some(ref path) = corpus_path {
        let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
            fail(&format!("Error reading corpus file '{}': {}", path, e))
        });
        builder = builder.with_tagged_corpus(&text);
    }

    let mut generator = builder
        .build()
        .unwrap_or_else(|e| fail(&format!("Error building generator: {}", e)));

    let analyzed = generator.analyze_context(&context);
    let tier = generator.calculate_difficulty_tier(i32::from(analyzed.power_level));
    println!(
        "Power level {} ({} tier), {} / {} influence / {}",
        analyzed.power_level,
        tier.name,
        analyzed.wealth_tier.name(),
        analyzed.influence_tier.name(),
        analyzed.life_stage.name()
    );
    println!();

    for event in generator.generate_events(&context, count) {
        if as_ron {
            match ron::ser::to_string_pretty(&event, ron::ser::PrettyConfig::default()) {
                Ok(text) => println!("{}\n", text),
                Err(e) => fail(&format!("Error serializing event: {}", e)),
            }
        } else {
            print_event(&event);
        }
    }
}

fn print_event(event: &Event) {
    println!("== {} ==", event.title);
    println!("[{} | {}] {}", event.event_type, event.difficulty, event.id);
    println!("{}", event.description);
    for (n, choice) in event.choices.iter().enumerate() {
        let effects: Vec<String> = choice
            .effects
            .iter()
            .map(|(stat, value)| format!("{} {}", stat, format_effect(value)))
            .collect();
        println!("  {}. {} ({})", n + 1, choice.text, effects.join(", "));
    }
    println!("  tags: {}", event.tags.join(", "));
    println!();
}

fn format_effect(value: &EffectValue) -> String {
    match value {
        EffectValue::Amount(v) => format!("{:+}", v),
        EffectValue::Range([min, max]) => format!("{:+}..{:+}", min, max),
        EffectValue::Flag(b) => b.to_string(),
        EffectValue::Text(t) => t.clone(),
    }
}

fn number(flag: &str, raw: &str) -> f64 {
    raw.parse()
        .unwrap_or_else(|_| fail(&format!("{} expects a number, got '{}'", flag, raw)))
}

fn pair(flag: &str, raw: &str) -> (String, String) {
    match raw.split_once('=') {
        Some((k, v)) if !k.is_empty() => (k.to_string(), v.to_string()),
        _ => fail(&format!("{} expects key=value, got '{}'", flag, raw)),
    }
}

/// Numbers and booleans are typed; anything else is text.
fn attribute(raw: &str) -> AttributeValue {
    if let Ok(n) = raw.parse::<f64>() {
        AttributeValue::Number(n)
    } else if let Ok(b) = raw.parse::<bool>() {
        AttributeValue::Bool(b)
    } else {
        AttributeValue::Text(raw.to_string())
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("{}", USAGE);
    process::exit(1);
}
