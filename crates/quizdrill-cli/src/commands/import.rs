//! The `quizdrill import` command.

use std::path::PathBuf;

use anyhow::Result;

use quizdrill_store::{import_snapshot, load_json, Snapshot};

use super::{load_settings, open_store};

pub fn execute(
    input: PathBuf,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_settings(config_path.as_deref(), data_dir)?;
    let store = open_store(&config)?;

    let snapshot: Snapshot = load_json(&input)?;
    let written = import_snapshot(&*store, &snapshot)?;

    println!(
        "Imported {written} key(s) from {} (exported {})",
        input.display(),
        snapshot.exported_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}
