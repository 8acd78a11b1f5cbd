// src/storage/history.rs

//! Record store snapshot I/O.
//!
//! On disk the snapshot is a single JSON document with the records as
//! a flat list, plus the run summary for quick inspection without
//! parsing every record. The in-memory map is rebuilt from the list
//! on load, keyed by each record's `full_name`.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::RepoRecord;

#[derive(Serialize)]
struct HistoryFile<'a, S: Serialize> {
    last_updated: String,
    summary: &'a S,
    repos: Vec<&'a RepoRecord>,
}

#[derive(Deserialize)]
struct HistoryFileOwned {
    #[serde(default)]
    repos: Vec<RepoRecord>,
}

/// Load the record store.
///
/// A missing file is a first run and yields an empty store. A
/// malformed file is logged and also yields an empty store rather than
/// aborting; the next save rewrites it.
pub async fn load_history(path: impl AsRef<Path>) -> HashMap<String, RepoRecord> {
    let path = path.as_ref();

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No history at {:?}; starting fresh", path);
            return HashMap::new();
        }
        Err(e) => {
            log::warn!("Failed to read history {:?}: {}", path, e);
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HistoryFileOwned>(&content) {
        Ok(file) => {
            log::info!("Loaded {} tracked repos from {:?}", file.repos.len(), path);
            file.repos
                .into_iter()
                .map(|record| (record.full_name.clone(), record))
                .collect()
        }
        Err(e) => {
            log::warn!("Malformed history {:?}: {}. Starting fresh.", path, e);
            HashMap::new()
        }
    }
}

/// Save the record store atomically, embedding the run summary. The
/// record list is sorted by identity for stable diffs.
pub async fn save_history<S: Serialize>(
    path: impl AsRef<Path>,
    repos: &HashMap<String, RepoRecord>,
    summary: &S,
) -> Result<()> {
    let mut records: Vec<&RepoRecord> = repos.values().collect();
    records.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    let file = HistoryFile {
        last_updated: Utc::now().to_rfc3339(),
        summary,
        repos: records,
    };
    super::write_json_atomic(path.as_ref(), &file).await?;
    log::info!("Saved {} tracked repos to {:?}", repos.len(), path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record(full_name: &str) -> RepoRecord {
        RepoRecord::new(full_name, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let repos = load_history(dir.path().join("nope.json")).await;
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut repos = HashMap::new();
        repos.insert("user/repo".to_string(), record("user/repo"));

        save_history(&path, &repos, &json!({"total": 1})).await.unwrap();
        let loaded = load_history(&path).await;

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["user/repo"], repos["user/repo"]);
    }

    #[tokio::test]
    async fn test_snapshot_repos_is_flat_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut repos = HashMap::new();
        repos.insert("user/b".to_string(), record("user/b"));
        repos.insert("user/a".to_string(), record("user/a"));

        save_history(&path, &repos, &json!({})).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        let list = value["repos"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        // Sorted by identity for stable diffs.
        assert_eq!(list[0]["full_name"], "user/a");
        assert_eq!(list[1]["full_name"], "user/b");
    }

    #[tokio::test]
    async fn test_list_shaped_snapshot_loads() {
        // The long-lived snapshot format: a flat record list under
        // "repos", with fields this version no longer requires.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let snapshot = r#"{
            "last_updated": "2025-11-02T10:00:00+00:00",
            "summary": {"total": 1},
            "repos": [
                {
                    "full_name": "user/old-repo",
                    "name": "old-repo",
                    "url": "https://github.com/user/old-repo",
                    "status": "has_weights"
                }
            ]
        }"#;
        tokio::fs::write(&path, snapshot).await.unwrap();

        let repos = load_history(&path).await;
        assert_eq!(repos.len(), 1);
        assert_eq!(
            repos["user/old-repo"].status,
            crate::models::RepoState::HasWeights
        );
    }

    #[tokio::test]
    async fn test_malformed_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        tokio::fs::write(&path, "{ this is not json").await.unwrap();

        let repos = load_history(&path).await;
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn test_no_leftover_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        save_history(&path, &HashMap::new(), &json!({})).await.unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
