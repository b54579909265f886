/// Corpus Stats — trains a model on a tagged corpus and reports on it.
///
/// Usage: corpus_stats --input <corpus.txt> [--state-size <n>] [--samples <n>] [--seed <n>]
use event_weaver::core::markov::{ContextualRequest, TextModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::process;

const USAGE: &str =
    "Usage: corpus_stats --input <corpus.txt> [--state-size <n>] [--samples <n>] [--seed <n>]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut state_size = 2usize;
    let mut samples = 3usize;
    let mut seed = 42u64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--state-size" if i + 1 < args.len() => {
                i += 1;
                state_size = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --state-size must be a positive number");
                    process::exit(1);
                });
            }
            "--samples" if i + 1 < args.len() => {
                i += 1;
                samples = args[i].parse().unwrap_or(3);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    if state_size == 0 {
        eprintln!("Error: --state-size must be a positive number");
        process::exit(1);
    }

    let text = std::fs::read_to_string(&input_path).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input_path, e);
        process::exit(1);
    });

    let mut model = TextModel::new(state_size);
    model.add_tagged_text(&text);

    let stats = model.stats();
    println!(
        "{} sentences, {} states, {} transitions",
        model.corpus().len(),
        stats.state_count,
        stats.total_transitions
    );

    let mut themes: Vec<&str> = model.themes().collect();
    themes.sort_unstable();
    if themes.is_empty() {
        println!("No themes found");
    } else {
        println!("Themes: {}", themes.join(", "));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut targets: Vec<Option<&str>> = vec![None];
    targets.extend(themes.iter().map(|t| Some(*t)));
    for theme in targets {
        println!();
        println!("-- {} --", theme.unwrap_or("all"));
        for _ in 0..samples {
            let request = ContextualRequest {
                theme,
                ..ContextualRequest::default()
            };
            println!("  {}", model.generate_contextual(&mut rng, &request));
        }
    }
}
