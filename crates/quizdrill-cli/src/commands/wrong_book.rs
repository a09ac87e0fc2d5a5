//! The `quizdrill wrong-book` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use comfy_table::{Cell, Table};

use super::{load_settings, open_deck};

pub fn execute(
    deck_path: PathBuf,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_settings(config_path.as_deref(), data_dir)?;
    let (deck, engine) = open_deck(&deck_path, &config)?;

    let entries = engine.wrong_book().sorted_by_wrong_count();
    if entries.is_empty() {
        println!("Wrong book is empty.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Question", "Misses", "Last missed", "Prompt"]);
    for entry in &entries {
        let prompt = deck
            .question(&entry.question_id)
            .map_or("(not in deck)", |q| q.prompt.as_str());
        table.add_row(vec![
            Cell::new(&entry.question_id),
            Cell::new(entry.wrong_count),
            Cell::new(
                entry
                    .last_wrong_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M"),
            ),
            Cell::new(prompt),
        ]);
    }

    println!("{table}");
    println!("{} question(s) to review.", entries.len());
    Ok(())
}
