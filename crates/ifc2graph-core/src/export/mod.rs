//! Offline exports of a model that do not need a graph store.

pub mod arrows;

pub use arrows::{default_output_path, export_arrows, ArrowsDocument, ArrowsOptions};
