// src/pipeline/reconcile.rs

//! The reconciliation engine.
//!
//! One run walks every configured query over two sort orders, applies
//! the per-repository delta logic, and leaves the updated record store
//! and candidate queue in memory for the caller to persist.
//!
//! Everything is sequential on purpose: the API rate limit is the
//! bottleneck, so there is nothing to win by parallelizing fetches.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use url::Url;

use crate::detectors::{
    ComingSoonDetector, ComingSoonVerdict, ConferenceDetector, ConferenceVerdict, RelevanceFilter,
    WeightDetector, WeightVerdict,
};
use crate::error::Result;
use crate::models::{CandidateSource, Config, RepoRecord, RepoState};
use crate::queue::CandidateQueue;
use crate::services::{RepoHost, SearchRepo, SortOrder};
use crate::storage;

/// Tracker state for one process: record store, candidate queue,
/// compiled classifiers, and the per-run bookkeeping lists.
pub struct Tracker {
    config: Config,
    repos: HashMap<String, RepoRecord>,
    queue: CandidateQueue,
    weights: WeightDetector,
    promises: ComingSoonDetector,
    venues: ConferenceDetector,
    relevance: RelevanceFilter,
    fresh_releases: Vec<String>,
    new_repos: Vec<String>,
    watchlist_updates: Vec<String>,
}

impl Tracker {
    /// Build a tracker with compiled classifiers. The store and queue
    /// start empty; use [`Tracker::load`] to restore a snapshot.
    pub fn new(config: Config) -> Result<Self> {
        let weights = WeightDetector::new(&config.detection)?;
        let promises = ComingSoonDetector::new()?;
        let venues = ConferenceDetector::new(&config.detection)?;
        let relevance = RelevanceFilter::new(&config.relevance);

        Ok(Self {
            config,
            repos: HashMap::new(),
            queue: CandidateQueue::new(),
            weights,
            promises,
            venues,
            relevance,
            fresh_releases: Vec::new(),
            new_repos: Vec::new(),
            watchlist_updates: Vec::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repos(&self) -> &HashMap<String, RepoRecord> {
        &self.repos
    }

    pub fn queue(&self) -> &CandidateQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut CandidateQueue {
        &mut self.queue
    }

    /// Repos that transitioned into weights during the current run.
    pub fn fresh_releases(&self) -> &[String] {
        &self.fresh_releases
    }

    /// Repos first tracked during the current run.
    pub fn new_repos(&self) -> &[String] {
        &self.new_repos
    }

    /// Watchlist repos whose state changed during the current run,
    /// in either direction.
    pub fn watchlist_updates(&self) -> &[String] {
        &self.watchlist_updates
    }

    /// Restore the record store and candidate queue from disk.
    ///
    /// After loading, every record that already qualifies for the
    /// queue is promoted. This repairs queues saved before a record
    /// became eligible (for example when an identifier was only found
    /// on a later check).
    pub async fn load(&mut self, history_path: impl AsRef<Path>, queue_path: impl AsRef<Path>) {
        self.repos = storage::load_history(history_path).await;
        self.queue = storage::load_queue(queue_path).await;

        for record in self.repos.values_mut() {
            if self.queue.contains(&record.full_name)
                || self.queue.promote(record, CandidateSource::Auto)
            {
                record.ru_candidate = true;
            }
        }
    }

    /// Persist the record store (with its summary) and the queue.
    pub async fn save(
        &self,
        history_path: impl AsRef<Path>,
        queue_path: impl AsRef<Path>,
        today: NaiveDate,
    ) -> Result<()> {
        let summary = self.summary(today);
        storage::save_history(history_path, &self.repos, &summary).await?;
        storage::save_queue(queue_path, &self.queue).await?;
        Ok(())
    }

    /// Aggregate the current store state.
    pub fn summary(&self, today: NaiveDate) -> super::Summary {
        super::Summary::compute(
            &self.repos,
            &self.queue,
            self.new_repos.len(),
            today,
            self.config.search.fresh_window_days,
        )
    }

    /// One reconciliation run over all configured queries.
    ///
    /// Each query gets two discovery passes, popularity-sorted and
    /// recency-sorted; a single ordering systematically misses either
    /// recent long-tail work or older but still-tracked work. Results
    /// are deduplicated across passes and queries with a run-scoped
    /// seen-set, so each repo goes through the delta logic at most
    /// once per run.
    pub async fn reconcile(&mut self, host: &dyn RepoHost, today: NaiveDate) -> Result<()> {
        self.fresh_releases.clear();
        self.new_repos.clear();
        self.watchlist_updates.clear();

        let queries = self.config.queries.clone();
        let min_stars = self.config.search.min_stars;
        let created_after = self.config.search.created_after();
        let max_results = self.config.search.max_results_per_query;

        let mut seen: HashSet<String> = HashSet::new();

        for query in &queries {
            log::info!("Searching: {}", query);
            for sort in [SortOrder::Stars, SortOrder::Updated] {
                let results = match host
                    .search_repos(query, min_stars, &created_after, max_results, sort)
                    .await
                {
                    Ok(results) => results,
                    Err(e) => {
                        // One failed pass must not sink the whole run.
                        log::warn!("Search failed for '{}' ({:?}): {}", query, sort, e);
                        continue;
                    }
                };

                for repo in &results {
                    if repo.full_name.is_empty() || !seen.insert(repo.full_name.clone()) {
                        continue;
                    }
                    self.process_discovery(host, repo, today).await;
                }
            }
        }

        log::info!(
            "Run complete: {} tracked, {} new, {} fresh releases",
            self.repos.len(),
            self.new_repos.len(),
            self.fresh_releases.len()
        );
        Ok(())
    }

    /// Apply the delta case for one discovered repository.
    async fn process_discovery(&mut self, host: &dyn RepoHost, repo: &SearchRepo, today: NaiveDate) {
        match self.repos.get(&repo.full_name).map(|r| r.status) {
            Some(RepoState::HasWeights) => self.check_stable(host, repo, today).await,
            Some(_) => self.recheck(host, repo, today).await,
            None => self.discover_new(host, repo, today).await,
        }
    }

    /// Stable case: weights already confirmed. Only the venue
    /// classification is refreshed; weight and promise checks are
    /// skipped since the state cannot regress out of weights here.
    /// Promotion is re-attempted because a newly found paper
    /// identifier can make an old stable record eligible.
    async fn check_stable(&mut self, host: &dyn RepoHost, repo: &SearchRepo, today: NaiveDate) {
        let limit = self.config.search.stable_recheck_limit;
        let refresh_venue = limit == 0
            || self
                .repos
                .get(&repo.full_name)
                .map(|r| r.stable_checks < limit)
                .unwrap_or(false);

        let venue = if refresh_venue {
            let readme = fetch_readme(host, &repo.full_name).await;
            let description = repo.description.as_deref().unwrap_or("");
            Some(self.venues.detect(&readme, description))
        } else {
            None
        };

        let Some(record) = self.repos.get_mut(&repo.full_name) else {
            return;
        };
        record.apply_metadata(repo);
        if let Some(venue) = venue {
            apply_venue(record, venue);
        }
        record.stable_checks += 1;
        record.touch(today);

        if self.queue.promote(record, CandidateSource::Auto) {
            record.ru_candidate = true;
        }
    }

    /// Watchlist/dormant case: re-fetch documentation, run all three
    /// classifiers and recompute the state.
    async fn recheck(&mut self, host: &dyn RepoHost, repo: &SearchRepo, today: NaiveDate) {
        let readme = fetch_readme(host, &repo.full_name).await;
        let description = repo.description.as_deref().unwrap_or("");

        let weight = self.weights.detect(&readme);
        let promise = self.promises.detect(&readme);
        let venue = self.venues.detect(&readme, description);

        let Some(record) = self.repos.get_mut(&repo.full_name) else {
            return;
        };
        let before = record.status;
        record.apply_metadata(repo);
        apply_scan(record, weight, promise, venue, today);

        if before == RepoState::ComingSoon && record.status != before {
            log::info!(
                "Watchlist update: {} ({} -> {})",
                record.full_name,
                before.as_str(),
                record.status.as_str()
            );
            self.watchlist_updates.push(record.full_name.clone());
            if record.status == RepoState::HasWeights {
                log::info!("Fresh release: {}", record.full_name);
                self.fresh_releases.push(record.full_name.clone());
            }
        }

        if self.queue.promote(record, CandidateSource::Auto) {
            record.ru_candidate = true;
        }
    }

    /// New case: gate on relevance, then build a record and run the
    /// full detection path.
    async fn discover_new(&mut self, host: &dyn RepoHost, repo: &SearchRepo, today: NaiveDate) {
        let name = if repo.name.is_empty() {
            repo.full_name.rsplit('/').next().unwrap_or(&repo.full_name)
        } else {
            &repo.name
        };
        let description = repo.description.as_deref().unwrap_or("");

        if self.relevance.is_excluded(name, description) {
            log::debug!("Excluded aggregator: {}", repo.full_name);
            return;
        }
        if !self.relevance.is_relevant(name, description, &repo.topics) {
            log::debug!("Not relevant: {}", repo.full_name);
            return;
        }

        let readme = fetch_readme(host, &repo.full_name).await;
        let weight = self.weights.detect(&readme);
        let promise = self.promises.detect(&readme);
        let venue = self.venues.detect(&readme, description);

        let mut record = RepoRecord::new(&repo.full_name, today);
        record.apply_metadata(repo);
        apply_scan(&mut record, weight, promise, venue, today);

        if self.queue.promote(&record, CandidateSource::Auto) {
            record.ru_candidate = true;
        }

        log::info!(
            "New repo: {} ({}, {} stars)",
            record.full_name,
            record.status.as_str(),
            record.stars
        );
        self.new_repos.push(record.full_name.clone());
        self.repos.insert(record.full_name.clone(), record);
    }

    /// Operator action: queue a tracked repo with manual provenance.
    /// Returns `None` when the repo is not tracked, otherwise whether
    /// a new entry was created.
    pub fn promote_manual(&mut self, full_name: &str) -> Option<bool> {
        let record = self.repos.get_mut(full_name)?;
        let added = self.queue.promote(record, CandidateSource::Manual);
        if added {
            record.ru_candidate = true;
        }
        Some(added)
    }

    /// Out-of-band submissions: repository URLs provided directly,
    /// bypassing the relevance gate. Invalid URLs are skipped; the
    /// rest of the batch proceeds. Promotion uses manual provenance,
    /// so a paper identifier is not required.
    pub async fn process_submissions(
        &mut self,
        host: &dyn RepoHost,
        urls: &[String],
        today: NaiveDate,
    ) {
        for url in urls {
            let Some(full_name) = parse_repo_url(url) else {
                log::warn!("Skipping invalid submission: {}", url);
                continue;
            };

            let readme = fetch_readme(host, &full_name).await;
            let weight = self.weights.detect(&readme);
            let promise = self.promises.detect(&readme);
            let venue = self.venues.detect(&readme, "");

            let is_new = !self.repos.contains_key(&full_name);
            let record = self
                .repos
                .entry(full_name.clone())
                .or_insert_with(|| RepoRecord::new(&full_name, today));
            apply_scan(record, weight, promise, venue, today);

            if self.queue.promote(record, CandidateSource::Manual) {
                record.ru_candidate = true;
            }
            if is_new {
                log::info!("Submitted repo tracked: {}", full_name);
                self.new_repos.push(full_name);
            }
        }
    }
}

/// Shared state computation for the full-scan cases: weight evidence
/// wins, then promise language, else no weights. Routing the result
/// through `update_status` is what keeps the transition bookkeeping
/// consistent.
fn apply_scan(
    record: &mut RepoRecord,
    weight: WeightVerdict,
    promise: ComingSoonVerdict,
    venue: ConferenceVerdict,
    today: NaiveDate,
) {
    let new_status = if weight.has_weights() {
        RepoState::HasWeights
    } else if promise.detected {
        RepoState::ComingSoon
    } else {
        RepoState::NoWeights
    };

    record.weight_status = weight.status;
    record.weight_confidence = weight.confidence;
    record.weight_details = weight.details;
    record.coming_soon_detected = promise.detected;
    record.coming_soon_details = promise.details;
    apply_venue(record, venue);

    record.update_status(new_status, today);
}

/// Venue fields are only overwritten with found values; an empty or
/// unfetchable README must not erase a venue recorded earlier.
fn apply_venue(record: &mut RepoRecord, venue: ConferenceVerdict) {
    if venue.conference.is_some() {
        record.conference = venue.conference;
    }
    if venue.year.is_some() {
        record.conference_year = venue.year;
    }
    if venue.arxiv_id.is_some() {
        record.arxiv_id = venue.arxiv_id;
    }
    if !venue.details.is_empty() {
        record.conference_details = venue.details;
    }
}

async fn fetch_readme(host: &dyn RepoHost, full_name: &str) -> String {
    match full_name.split_once('/') {
        Some((owner, name)) => host.get_readme(owner, name).await,
        None => String::new(),
    }
}

/// Parse a submission into an `owner/name` identity. Accepts full
/// GitHub URLs and bare `owner/name` strings.
fn parse_repo_url(input: &str) -> Option<String> {
    let input = input.trim();

    if let Ok(url) = Url::parse(input) {
        let host = url.host_str()?;
        if host != "github.com" && host != "www.github.com" {
            return None;
        }
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let name = segments.next()?.trim_end_matches(".git");
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        return Some(format!("{}/{}", owner, name));
    }

    let (owner, name) = input.split_once('/')?;
    let name = name.trim_end_matches(".git");
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(format!("{}/{}", owner, name))
}
