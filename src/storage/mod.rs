// src/storage/mod.rs

//! Snapshot persistence.
//!
//! Both the record store and the candidate queue are JSON files,
//! written atomically (temp file then rename) so a crash mid-write
//! never leaves a truncated snapshot behind.

mod history;
mod queue_file;

pub use history::{load_history, save_history};
pub use queue_file::{load_queue, save_queue};

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Serialize to pretty JSON and atomically replace `path`.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, json.as_bytes()).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
