//! quizdrill-store — Durable storage for drill state.
//!
//! Provides [`FileStore`], a `StateStore` that keeps one JSON file per key,
//! and snapshot export/import for moving a namespace between stores.

pub mod file;
pub mod snapshot;

pub use file::FileStore;
pub use snapshot::{clear_prefix, export_snapshot, import_snapshot, load_json, save_json, Snapshot};
