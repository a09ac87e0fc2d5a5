//! The `quizdrill validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizdrill_core::deck::{self, Deck, ValidationWarning};

pub fn execute(deck_path: PathBuf) -> Result<()> {
    let decks = if deck_path.is_dir() {
        deck::load_deck_directory(&deck_path)?
    } else {
        vec![deck::parse_deck(&deck_path)?]
    };

    let mut total_warnings = 0;
    for d in &decks {
        // The deck id names every progress key, so show it as stored.
        println!(
            "Deck: {} [{}] ({} questions)",
            d.name,
            d.id,
            d.questions.len()
        );
        let mut warnings = deck::validate_deck(d);
        warnings.extend(shared_namespace_warnings(d, &decks));
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All decks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }
    Ok(())
}

/// Decks loaded together that reuse an id would overwrite each other's progress.
fn shared_namespace_warnings(deck: &Deck, all: &[Deck]) -> Option<ValidationWarning> {
    let sharing = all.iter().filter(|d| d.id == deck.id).count();
    (sharing > 1).then(|| ValidationWarning {
        question_id: None,
        message: format!(
            "deck id '{}' is shared by {sharing} decks; their progress would collide",
            deck.id
        ),
    })
}
