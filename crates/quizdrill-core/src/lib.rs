//! quizdrill-core — Adaptive drill engine, progress tracking, and rewards.
//!
//! This crate holds the per-item weight policy, weighted selection, session
//! statistics, reward scoring and the wrong book, all persisted through the
//! [`store::StateStore`] seam. [`engine::DrillEngine`] ties them together.

pub mod config;
pub mod deck;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod reward;
pub mod selector;
pub mod stats;
pub mod store;
pub mod tracker;
pub mod wrong_book;
