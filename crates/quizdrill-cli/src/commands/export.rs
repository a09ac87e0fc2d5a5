//! The `quizdrill export` command.

use std::path::PathBuf;

use anyhow::Result;

use quizdrill_store::{export_snapshot, save_json};

use super::{load_settings, open_store};

pub fn execute(
    output: PathBuf,
    prefix: String,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_settings(config_path.as_deref(), data_dir)?;
    let store = open_store(&config)?;

    let snapshot = export_snapshot(&*store, &prefix)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    save_json(&output, &snapshot)?;

    println!("Exported {} key(s) to {}", snapshot.count, output.display());
    Ok(())
}
