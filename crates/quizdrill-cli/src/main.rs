//! quizdrill CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizdrill", version, about = "Adaptive flashcard drill")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that touches persisted state.
#[derive(clap::Args, Clone)]
struct StateArgs {
    /// Directory holding drill state (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drill a deck interactively
    Drill {
        /// Path to a .toml deck
        #[arg(long)]
        deck: PathBuf,

        /// Only ask questions from the wrong book
        #[arg(long)]
        review: bool,

        /// Stop after this many answers
        #[arg(long)]
        limit: Option<usize>,

        /// Seed for question selection
        #[arg(long)]
        seed: Option<u64>,

        /// Only ask questions with one of these tags (comma-separated)
        #[arg(long)]
        filter: Option<String>,

        #[command(flatten)]
        state: StateArgs,
    },

    /// Show progress for a deck
    Stats {
        /// Path to a .toml deck
        #[arg(long)]
        deck: PathBuf,

        /// Print machine-readable JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        state: StateArgs,
    },

    /// List outstanding mistakes, most-missed first
    WrongBook {
        /// Path to a .toml deck
        #[arg(long)]
        deck: PathBuf,

        #[command(flatten)]
        state: StateArgs,
    },

    /// Reset progress for a deck
    Reset {
        /// Path to a .toml deck
        #[arg(long)]
        deck: PathBuf,

        /// Only re-arm accuracy milestones
        #[arg(long, conflicts_with = "all")]
        milestones: bool,

        /// Also clear score, milestones and the wrong book
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        state: StateArgs,
    },

    /// Export stored state to a JSON snapshot
    Export {
        /// Snapshot file to write
        #[arg(long)]
        output: PathBuf,

        /// Only export keys starting with this prefix
        #[arg(long, default_value = "")]
        prefix: String,

        #[command(flatten)]
        state: StateArgs,
    },

    /// Import a JSON snapshot into the state directory
    Import {
        /// Snapshot file to read
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        state: StateArgs,
    },

    /// Validate deck TOML files
    Validate {
        /// Path to deck file or directory
        #[arg(long)]
        deck: PathBuf,
    },

    /// Create starter config and example deck
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizdrill=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Drill {
            deck,
            review,
            limit,
            seed,
            filter,
            state,
        } => commands::drill::execute(
            deck,
            commands::drill::DrillOptions {
                review,
                limit,
                seed,
                filter,
            },
            state.data_dir,
            state.config,
        ),
        Commands::Stats { deck, json, state } => {
            commands::stats::execute(deck, json, state.data_dir, state.config)
        }
        Commands::WrongBook { deck, state } => {
            commands::wrong_book::execute(deck, state.data_dir, state.config)
        }
        Commands::Reset {
            deck,
            milestones,
            all,
            state,
        } => commands::reset::execute(deck, milestones, all, state.data_dir, state.config),
        Commands::Export {
            output,
            prefix,
            state,
        } => commands::export::execute(output, prefix, state.data_dir, state.config),
        Commands::Import { input, state } => {
            commands::import::execute(input, state.data_dir, state.config)
        }
        Commands::Validate { deck } => commands::validate::execute(deck),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
