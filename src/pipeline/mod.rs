// src/pipeline/mod.rs

//! Reconciliation pipeline: the engine, run summaries and report
//! writers.

mod export;
mod reconcile;
mod summary;

pub use export::{export_csv, export_json, export_markdown};
pub use reconcile::Tracker;
pub use summary::Summary;
