//! The `quizdrill init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("quizdrill.toml").exists() {
        println!("quizdrill.toml already exists, skipping.");
    } else {
        std::fs::write("quizdrill.toml", SAMPLE_CONFIG)?;
        println!("Created quizdrill.toml");
    }

    std::fs::create_dir_all("decks")?;
    let example_path = Path::new("decks/example.toml");
    if example_path.exists() {
        println!("decks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DECK)?;
        println!("Created decks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: quizdrill validate --deck decks/example.toml");
    println!("  2. Run: quizdrill drill --deck decks/example.toml");
    println!("  3. Run: quizdrill stats --deck decks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizdrill configuration

data_dir = "./quizdrill-data"
# seed = 42
# "session" resets the global streak and settlement counter on every run,
# "persisted" keeps them in the data directory.
counter_persistence = "session"

[policy]
default_weight = 10
min_weight = 1
weight_decrement = 2
mastery_threshold = 3
settlement_interval = 20
milestones = [80, 90, 95, 96, 97, 98, 99]
mastery_bonus = 50
victory_points = 500
# "five-tier", "three-tier", or a list such as
# streak_bands = [{ min = 1, points = 1 }, { min = 5, points = 5 }]
streak_bands = "five-tier"

[[policy.settlement_tiers]]
min_accuracy = 95
tier = "gold"
points = 200

[[policy.settlement_tiers]]
min_accuracy = 85
tier = "silver"
points = 100

[[policy.settlement_tiers]]
min_accuracy = 70
tier = "bronze"
points = 50
"#;

const EXAMPLE_DECK: &str = r#"[deck]
id = "example"
name = "Example Deck"
description = "A few warm-up questions"

[[questions]]
id = "capital_france"
prompt = "What is the capital of France?"
answer = "Paris"
choices = ["Berlin", "Paris", "Madrid", "Rome"]
tags = ["geography"]

[[questions]]
id = "h2o"
prompt = "Which element has the symbol O?"
answer = "Oxygen"
explanation = "O is oxygen; Os is osmium."
tags = ["science"]

[[questions]]
id = "seven_times_eight"
prompt = "7 x 8 = ?"
answer = "56"
tags = ["math"]
"#;
