// src/storage/queue_file.rs

//! Candidate queue snapshot I/O.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::CandidateEntry;
use crate::queue::CandidateQueue;

#[derive(Serialize)]
struct QueueFile<'a> {
    last_updated: String,
    candidates: &'a [CandidateEntry],
}

#[derive(Deserialize)]
struct QueueFileOwned {
    #[serde(default)]
    candidates: Vec<CandidateEntry>,
}

/// Load the candidate queue. Missing or malformed files yield an
/// empty queue, same policy as the record store.
pub async fn load_queue(path: impl AsRef<Path>) -> CandidateQueue {
    let path = path.as_ref();

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return CandidateQueue::new();
        }
        Err(e) => {
            log::warn!("Failed to read queue {:?}: {}", path, e);
            return CandidateQueue::new();
        }
    };

    match serde_json::from_str::<QueueFileOwned>(&content) {
        Ok(file) => CandidateQueue::from_entries(file.candidates),
        Err(e) => {
            log::warn!("Malformed queue {:?}: {}. Starting empty.", path, e);
            CandidateQueue::new()
        }
    }
}

/// Save the candidate queue atomically.
pub async fn save_queue(path: impl AsRef<Path>, queue: &CandidateQueue) -> Result<()> {
    let file = QueueFile {
        last_updated: Utc::now().to_rfc3339(),
        candidates: queue.entries(),
    };
    super::write_json_atomic(path.as_ref(), &file).await
}
