//! Candidate queue entry types.
//!
//! The queue tracks repositories promoted for downstream reproduction
//! work. It is keyed by the same `owner/name` identity as the record
//! store but lives in its own file with its own lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an entry got into the queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Promoted by the reconciliation run
    Auto,
    /// Added by an operator
    Manual,
}

/// Workflow status of a queue entry.
///
/// Only ever changed by an explicit operator action, never by
/// reconciliation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Pending,
    Processing,
    Completed,
    Skipped,
}

impl CandidateStatus {
    /// Parse a status from its CLI/wire spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }
}

/// One repository queued for reproduction work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateEntry {
    /// Identity string (`owner/name`)
    pub full_name: String,

    /// Repository URL
    pub url: String,

    /// External paper identifier; empty for manual adds without one
    #[serde(default)]
    pub arxiv_id: String,

    /// When the entry was created
    pub added_at: DateTime<Utc>,

    /// Provenance of the entry
    pub source: CandidateSource,

    /// Workflow status
    pub status: CandidateStatus,

    /// Free-text operator notes
    #[serde(default)]
    pub notes: String,
}

impl CandidateEntry {
    /// Create a fresh `pending` entry.
    pub fn new(full_name: &str, url: &str, arxiv_id: &str, source: CandidateSource) -> Self {
        Self {
            full_name: full_name.to_string(),
            url: url.to_string(),
            arxiv_id: arxiv_id.to_string(),
            added_at: Utc::now(),
            source,
            status: CandidateStatus::Pending,
            notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            CandidateStatus::parse("processing"),
            Some(CandidateStatus::Processing)
        );
        assert_eq!(CandidateStatus::parse("done"), None);
    }

    #[test]
    fn test_new_entry_is_pending() {
        let entry = CandidateEntry::new(
            "user/repo",
            "https://github.com/user/repo",
            "2401.12345",
            CandidateSource::Auto,
        );
        assert_eq!(entry.status, CandidateStatus::Pending);
        assert_eq!(entry.source, CandidateSource::Auto);
    }

    #[test]
    fn test_serde_wire_format() {
        let entry = CandidateEntry::new("user/repo", "https://github.com/user/repo", "", {
            CandidateSource::Manual
        });
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"manual\""));
        assert!(json.contains("\"pending\""));
    }
}
