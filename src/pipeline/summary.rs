// src/pipeline/summary.rs

//! Aggregation over the record store for reporting.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::models::{RepoRecord, RepoState};
use crate::queue::CandidateQueue;

/// Run summary embedded in the snapshot and printed after a run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_repos: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_weight_status: BTreeMap<String, usize>,
    pub by_conference: BTreeMap<String, usize>,
    pub fresh_releases: usize,
    pub new_this_run: usize,
    pub queue_pending: usize,
    pub generated_at: String,
}

impl Summary {
    /// Aggregate the store. `fresh_window_days` matches the freshness
    /// rule used by the engine.
    pub fn compute(
        repos: &HashMap<String, RepoRecord>,
        queue: &CandidateQueue,
        new_this_run: usize,
        today: NaiveDate,
        fresh_window_days: i64,
    ) -> Self {
        let mut by_status = BTreeMap::new();
        let mut by_weight_status = BTreeMap::new();
        let mut by_conference = BTreeMap::new();
        let mut fresh_releases = 0;

        for record in repos.values() {
            *by_status.entry(record.status.as_str().to_string()).or_insert(0) += 1;
            *by_weight_status
                .entry(record.weight_status.clone())
                .or_insert(0) += 1;
            if let Some(conference) = &record.conference {
                *by_conference.entry(conference.clone()).or_insert(0) += 1;
            }
            if record.is_fresh_release(today, fresh_window_days) {
                fresh_releases += 1;
            }
        }

        Self {
            total_repos: repos.len(),
            by_status,
            by_weight_status,
            by_conference,
            fresh_releases,
            new_this_run,
            queue_pending: queue.pending().len(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Count for one lifecycle state.
    pub fn status_count(&self, status: RepoState) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let today = date("2026-01-20");
        let mut repos = HashMap::new();

        let mut a = RepoRecord::new("x/a", date("2026-01-01"));
        a.update_status(RepoState::HasWeights, date("2026-01-18"));
        a.weight_status = "HF".to_string();
        a.conference = Some("CVPR".to_string());
        repos.insert(a.full_name.clone(), a);

        let mut b = RepoRecord::new("x/b", date("2026-01-01"));
        b.update_status(RepoState::ComingSoon, date("2026-01-05"));
        repos.insert(b.full_name.clone(), b);

        let summary = Summary::compute(&repos, &CandidateQueue::new(), 1, today, 7);

        assert_eq!(summary.total_repos, 2);
        assert_eq!(summary.status_count(RepoState::HasWeights), 1);
        assert_eq!(summary.status_count(RepoState::ComingSoon), 1);
        assert_eq!(summary.status_count(RepoState::NoWeights), 0);
        assert_eq!(summary.by_conference.get("CVPR"), Some(&1));
        assert_eq!(summary.fresh_releases, 1);
        assert_eq!(summary.new_this_run, 1);
    }

    #[test]
    fn test_fresh_count_respects_window() {
        let mut repos = HashMap::new();
        let mut a = RepoRecord::new("x/a", date("2026-01-01"));
        a.update_status(RepoState::HasWeights, date("2026-01-02"));
        repos.insert(a.full_name.clone(), a);

        let late = date("2026-01-20");
        let summary = Summary::compute(&repos, &CandidateQueue::new(), 0, late, 7);
        assert_eq!(summary.fresh_releases, 0);
    }
}
