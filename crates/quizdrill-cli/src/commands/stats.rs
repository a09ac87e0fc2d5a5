//! The `quizdrill stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use quizdrill_core::deck::Deck;
use quizdrill_core::engine::DrillEngine;
use quizdrill_core::stats::SessionStats;
use quizdrill_core::tracker::{Progress, TrackerSummary};

use super::{load_settings, open_deck};

/// Machine-readable progress report.
#[derive(Debug, Serialize)]
struct StatsReport<'a> {
    deck: &'a str,
    progress: Progress,
    summary: TrackerSummary,
    session: SessionStats,
    score: u64,
    wrong_book: usize,
    questions: Vec<QuestionRow<'a>>,
}

#[derive(Debug, Serialize)]
struct QuestionRow<'a> {
    id: &'a str,
    weight: Option<u32>,
    streak: u32,
    correct: u32,
    attempts: u32,
    mastered: bool,
}

pub fn execute(
    deck_path: PathBuf,
    json: bool,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_settings(config_path.as_deref(), data_dir)?;
    let (deck, engine) = open_deck(&deck_path, &config)?;
    let report = build_report(&deck, &engine);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&deck, &report);
    }
    Ok(())
}

fn build_report<'a>(deck: &'a Deck, engine: &DrillEngine) -> StatsReport<'a> {
    let tracker = engine.tracker();
    let questions = deck
        .questions
        .iter()
        .map(|q| {
            let state = tracker.state(&q.id);
            QuestionRow {
                id: &q.id,
                weight: state.map(|s| s.weight),
                streak: state.map_or(0, |s| s.consecutive_correct),
                correct: state.map_or(0, |s| s.correct_count),
                attempts: state.map_or(0, |s| s.total_attempts),
                mastered: tracker.is_mastered(&q.id),
            }
        })
        .collect();

    StatsReport {
        deck: &deck.id,
        progress: tracker.progress(Some(deck.questions.len())),
        summary: tracker.summary(),
        session: engine.session().stats(),
        score: engine.ledger().score(),
        wrong_book: engine.wrong_book().count(),
        questions,
    }
}

fn print_report(deck: &Deck, report: &StatsReport<'_>) {
    let mut table = Table::new();
    table.set_header(vec![
        "Question", "Weight", "Streak", "Correct", "Attempts", "Status",
    ]);

    for row in &report.questions {
        let status = if row.mastered {
            "mastered"
        } else if row.attempts == 0 {
            "new"
        } else {
            "learning"
        };
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(row.weight.map_or_else(|| "-".to_string(), |w| w.to_string())),
            Cell::new(row.streak),
            Cell::new(row.correct),
            Cell::new(row.attempts),
            Cell::new(status),
        ]);
    }

    println!("Deck: {} ({})", deck.name, deck.id);
    println!("{table}");
    println!(
        "Mastered: {}/{} ({} learning)",
        report.progress.mastered, report.progress.total, report.progress.learning
    );
    println!(
        "Accuracy: {}% ({}/{} answers)",
        report.session.accuracy_rate, report.session.correct, report.session.total
    );
    println!("Score: {}", report.score);
    println!("Wrong book: {} question(s)", report.wrong_book);
}
