//! The `quizdrill reset` command.

use std::path::PathBuf;

use anyhow::Result;

use super::{load_settings, open_deck};

pub fn execute(
    deck_path: PathBuf,
    milestones_only: bool,
    all: bool,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_settings(config_path.as_deref(), data_dir)?;
    let (deck, mut engine) = open_deck(&deck_path, &config)?;

    if milestones_only {
        engine.reset_milestones();
        println!("Milestones re-armed for {}.", deck.id);
    } else if all {
        engine.reset_all();
        println!("All state cleared for {}.", deck.id);
    } else {
        engine.reset_progress();
        println!("Progress reset for {}. Score and wrong book kept.", deck.id);
    }
    Ok(())
}
