// src/queue.rs

//! Candidate queue management.
//!
//! Repositories whose weights are confirmed get promoted here for
//! downstream reproduction work. Promotion is idempotent: once an
//! entry exists it is never overwritten, so operator edits (status,
//! notes) survive later reconciliation runs.

use crate::models::{CandidateEntry, CandidateSource, CandidateStatus, RepoRecord, RepoState};

/// In-memory queue of promotion candidates, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CandidateQueue {
    entries: Vec<CandidateEntry>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the queue from persisted entries.
    pub fn from_entries(entries: Vec<CandidateEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CandidateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.entries.iter().any(|e| e.full_name == full_name)
    }

    pub fn get(&self, full_name: &str) -> Option<&CandidateEntry> {
        self.entries.iter().find(|e| e.full_name == full_name)
    }

    /// Entries still waiting to be picked up.
    pub fn pending(&self) -> Vec<&CandidateEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == CandidateStatus::Pending)
            .collect()
    }

    /// Promote a record into the queue. Returns whether a new entry
    /// was added.
    ///
    /// Requires confirmed weights. Automatic promotion additionally
    /// requires a paper identifier, so that only repositories tied to
    /// a publication get queued without operator review. An existing
    /// entry is left untouched regardless of its status.
    pub fn promote(&mut self, record: &RepoRecord, source: CandidateSource) -> bool {
        if self.contains(&record.full_name) {
            return false;
        }
        if record.status != RepoState::HasWeights {
            return false;
        }
        let arxiv_id = record.arxiv_id.as_deref().unwrap_or("");
        if source == CandidateSource::Auto && arxiv_id.is_empty() {
            return false;
        }

        self.entries.push(CandidateEntry::new(
            &record.full_name,
            &record.url,
            arxiv_id,
            source,
        ));
        log::info!("Queued candidate: {}", record.full_name);
        true
    }

    /// Operator action: move an entry to a new workflow status.
    /// Returns whether the entry was found.
    pub fn update_status(
        &mut self,
        full_name: &str,
        status: CandidateStatus,
        notes: Option<&str>,
    ) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.full_name == full_name) else {
            return false;
        };
        entry.status = status;
        if let Some(notes) = notes {
            entry.notes = notes.to_string();
        }
        true
    }

    /// Operator action: drop an entry. Returns whether it existed.
    pub fn remove(&mut self, full_name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.full_name != full_name);
        self.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(full_name: &str, status: RepoState, arxiv_id: Option<&str>) -> RepoRecord {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut record = RepoRecord::new(full_name, today);
        record.update_status(status, today);
        record.arxiv_id = arxiv_id.map(String::from);
        record
    }

    #[test]
    fn test_auto_promotion_needs_weights_and_paper_id() {
        let mut queue = CandidateQueue::new();

        let no_weights = record("a/no-weights", RepoState::NoWeights, Some("2401.00001"));
        assert!(!queue.promote(&no_weights, CandidateSource::Auto));

        let no_paper = record("a/no-paper", RepoState::HasWeights, None);
        assert!(!queue.promote(&no_paper, CandidateSource::Auto));

        let eligible = record("a/eligible", RepoState::HasWeights, Some("2401.00001"));
        assert!(queue.promote(&eligible, CandidateSource::Auto));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_manual_promotion_without_paper_id() {
        let mut queue = CandidateQueue::new();
        let r = record("a/manual", RepoState::HasWeights, None);
        assert!(queue.promote(&r, CandidateSource::Manual));
        assert_eq!(queue.get("a/manual").unwrap().arxiv_id, "");
    }

    #[test]
    fn test_promotion_is_idempotent() {
        let mut queue = CandidateQueue::new();
        let r = record("a/repo", RepoState::HasWeights, Some("2401.00001"));

        assert!(queue.promote(&r, CandidateSource::Auto));
        assert!(!queue.promote(&r, CandidateSource::Auto));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_promotion_preserves_operator_edits() {
        let mut queue = CandidateQueue::new();
        let r = record("a/repo", RepoState::HasWeights, Some("2401.00001"));
        queue.promote(&r, CandidateSource::Auto);

        assert!(queue.update_status("a/repo", CandidateStatus::Processing, Some("in progress")));

        // A later run re-promotes the same record; the entry keeps its
        // operator-set status and notes.
        assert!(!queue.promote(&r, CandidateSource::Auto));
        let entry = queue.get("a/repo").unwrap();
        assert_eq!(entry.status, CandidateStatus::Processing);
        assert_eq!(entry.notes, "in progress");
    }

    #[test]
    fn test_update_status_unknown_entry() {
        let mut queue = CandidateQueue::new();
        assert!(!queue.update_status("a/ghost", CandidateStatus::Completed, None));
    }

    #[test]
    fn test_remove() {
        let mut queue = CandidateQueue::new();
        let r = record("a/repo", RepoState::HasWeights, Some("2401.00001"));
        queue.promote(&r, CandidateSource::Auto);

        assert!(queue.remove("a/repo"));
        assert!(!queue.remove("a/repo"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pending_filter() {
        let mut queue = CandidateQueue::new();
        for name in ["a/one", "a/two", "a/three"] {
            let r = record(name, RepoState::HasWeights, Some("2401.00001"));
            queue.promote(&r, CandidateSource::Auto);
        }
        queue.update_status("a/two", CandidateStatus::Completed, None);

        let pending = queue.pending();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|e| e.status == CandidateStatus::Pending));
    }
}
