//! The `quizdrill drill` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use quizdrill_core::deck::Question;
use quizdrill_core::engine::{AnswerOutcome, DrillObserver};
use quizdrill_core::reward::{Celebration, SettlementReward, SettlementTier};

use super::{load_settings, open_deck};

/// Typed at the prompt to end the session early.
const QUIT: &str = ":q";

pub struct DrillOptions {
    pub review: bool,
    pub limit: Option<usize>,
    pub seed: Option<u64>,
    pub filter: Option<String>,
}

/// Prints engine events as they happen.
struct ConsoleObserver;

impl DrillObserver for ConsoleObserver {
    fn on_answer(&self, _: &AnswerOutcome) {}

    fn on_milestone(&self, threshold: u32, accuracy_rate: u32) {
        println!("  ** Milestone: accuracy reached {threshold}% (now {accuracy_rate}%)");
    }

    fn on_settlement(&self, reward: &SettlementReward, total_score: u64) {
        match reward.tier {
            SettlementTier::None => println!("  == Settlement: {}", reward.label),
            _ => println!(
                "  == Settlement: {} +{} (score {total_score})",
                reward.label, reward.points
            ),
        }
    }

    fn on_victory(&self, points: u32, total_score: u64) {
        println!("  !! Every question mastered! +{points} (score {total_score})");
    }
}

pub fn execute(
    deck_path: PathBuf,
    options: DrillOptions,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_settings(config_path.as_deref(), data_dir)?;
    if options.seed.is_some() {
        config.seed = options.seed;
    }

    let (mut deck, engine) = open_deck(&deck_path, &config)?;
    let mut engine = engine.with_observer(Box::new(ConsoleObserver));

    if let Some(filter_tags) = &options.filter {
        let tags: Vec<&str> = filter_tags.split(',').map(|s| s.trim()).collect();
        deck.retain_tags(&tags);
    }
    anyhow::ensure!(
        !deck.questions.is_empty(),
        "deck '{}' has no questions to drill",
        deck.id
    );

    engine.initialize(&deck.questions);
    let mode = if options.review { "review" } else { "drill" };
    println!(
        "{} ({} questions, {mode} mode). Type {QUIT} to stop.",
        deck.name,
        deck.questions.len()
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut answered = 0usize;
    let mut correct = 0usize;

    loop {
        if options.limit.is_some_and(|limit| answered >= limit) {
            break;
        }

        let next = if options.review {
            engine.select_review_question(&deck.questions)
        } else {
            engine.select_question(&deck.questions)
        };
        let Some(question) = next else {
            if options.review {
                println!("\nWrong book is empty. Nothing to review.");
            } else {
                println!("\nAll questions mastered.");
            }
            break;
        };

        ask(question, answered + 1)?;
        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let response = line?;
        if response.trim() == QUIT {
            break;
        }

        let is_correct = question.is_correct(&response);
        let Some(outcome) = engine.submit_answer(&question.id, is_correct) else {
            continue;
        };
        answered += 1;
        if is_correct {
            correct += 1;
        }
        print_feedback(question, &outcome);

        if outcome.settlement_due {
            engine.acknowledge_settlement();
        }
        if !options.review && options.filter.is_none() {
            engine.claim_victory(deck.questions.len());
        }
    }

    let progress = engine.tracker().progress(Some(deck.questions.len()));
    println!(
        "\nAnswered {answered} ({correct} correct). Mastered {}/{}. Score: {}",
        progress.mastered,
        progress.total,
        engine.ledger().score()
    );
    tracing::debug!(deck = %deck.id, answered, correct, "drill finished");

    Ok(())
}

fn ask(question: &Question, number: usize) -> Result<()> {
    println!("\n[{number}] {}", question.prompt);
    for (i, choice) in question.choices.iter().enumerate() {
        println!("  {}. {choice}", i + 1);
    }
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn print_feedback(question: &Question, outcome: &AnswerOutcome) {
    if !outcome.is_correct {
        println!("Wrong. The answer is: {}", question.answer);
        if let Some(explanation) = &question.explanation {
            println!("  {explanation}");
        }
        return;
    }

    let cheer = match outcome.celebration {
        Celebration::Mastered => "Mastered!",
        Celebration::Streak10 => "Unstoppable!",
        Celebration::Streak5 => "On fire!",
        Celebration::Streak3 => "Nice streak!",
        Celebration::Correct | Celebration::Miss => "Correct!",
    };
    println!(
        "{cheer} +{} (streak {}, score {})",
        outcome.points, outcome.global_streak, outcome.total_score
    );
}
