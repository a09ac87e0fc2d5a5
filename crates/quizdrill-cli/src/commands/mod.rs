//! Subcommand implementations.

pub mod drill;
pub mod export;
pub mod import;
pub mod init;
pub mod reset;
pub mod stats;
pub mod validate;
pub mod wrong_book;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use quizdrill_core::config::{load_config_from, DrillConfig};
use quizdrill_core::deck::{self, Deck};
use quizdrill_core::engine::DrillEngine;
use quizdrill_store::FileStore;

/// Load config, then apply command-line overrides on top.
pub fn load_settings(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<DrillConfig> {
    let mut config = load_config_from(config_path)?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

pub fn open_store(config: &DrillConfig) -> Result<Arc<FileStore>> {
    let store = FileStore::open(&config.data_dir).with_context(|| {
        format!(
            "failed to open data directory: {}",
            config.data_dir.display()
        )
    })?;
    Ok(Arc::new(store))
}

/// Parse a single deck file and open its engine.
pub fn open_deck(deck_path: &Path, config: &DrillConfig) -> Result<(Deck, DrillEngine)> {
    let deck = deck::parse_deck(deck_path)?;
    let store = open_store(config)?;
    let engine = DrillEngine::new(store, deck.id.clone(), config)?;
    Ok((deck, engine))
}
