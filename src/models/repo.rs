//! Tracked repository record and its state lifecycle.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked repository.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RepoState {
    /// Pretrained weights are available
    HasWeights,
    /// Weights promised but not yet released
    ComingSoon,
    /// No weights detected or promised
    NoWeights,
}

impl RepoState {
    /// Wire-format label (also used in reports).
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoState::HasWeights => "has_weights",
            RepoState::ComingSoon => "coming_soon",
            RepoState::NoWeights => "no_weights",
        }
    }

    /// Sort ordinal for reporting (weights first). Not a transition order.
    pub fn priority(&self) -> u8 {
        match self {
            RepoState::HasWeights => 0,
            RepoState::ComingSoon => 1,
            RepoState::NoWeights => 2,
        }
    }
}

impl Default for RepoState {
    fn default() -> Self {
        RepoState::NoWeights
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// One tracked repository, keyed by its `owner/name` identity.
///
/// `status` must only be changed through [`RepoRecord::update_status`],
/// which keeps `previous_status` and `status_changed_date` consistent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoRecord {
    /// Stable identity (`owner/name`)
    pub full_name: String,

    /// Display name (repository name only)
    pub name: String,

    /// Star count at last discovery
    #[serde(default)]
    pub stars: u32,

    /// Canonical repository URL
    pub url: String,

    /// Short description (truncated at construction)
    #[serde(default)]
    pub description: String,

    /// Creation date (date granularity)
    #[serde(default)]
    pub created_at: String,

    /// Last push/update date (date granularity)
    #[serde(default)]
    pub updated_at: String,

    /// Current lifecycle state
    #[serde(default)]
    pub status: RepoState,

    /// State before the last transition; never cleared once set
    #[serde(default)]
    pub previous_status: Option<RepoState>,

    /// Advanced on every touch, whether or not the state changed
    #[serde(default = "today")]
    pub last_checked: NaiveDate,

    /// Changed only when `status` changes value
    #[serde(default = "today")]
    pub status_changed_date: NaiveDate,

    /// Weight source label: "HF", "Release", "Cloud", "Extension" or "None"
    #[serde(default = "default_weight_status")]
    pub weight_status: String,

    /// Confidence tier for the weight label: "high", "medium", "low", "none"
    #[serde(default = "default_confidence")]
    pub weight_confidence: String,

    /// Evidence snippets from weight detection
    #[serde(default)]
    pub weight_details: Vec<String>,

    /// Detected venue (e.g. "CVPR")
    #[serde(default)]
    pub conference: Option<String>,

    /// Detected venue year
    #[serde(default)]
    pub conference_year: Option<String>,

    /// External paper identifier (arXiv)
    #[serde(default)]
    pub arxiv_id: Option<String>,

    /// Evidence snippets from venue detection
    #[serde(default)]
    pub conference_details: Vec<String>,

    /// Repository topic tags
    #[serde(default)]
    pub topics: Vec<String>,

    /// Whether promise language was found on the last full check
    #[serde(default)]
    pub coming_soon_detected: bool,

    /// Evidence snippets for the promise detection
    #[serde(default)]
    pub coming_soon_details: Vec<String>,

    /// Whether this record has been promoted to the candidate queue
    #[serde(default)]
    pub ru_candidate: bool,

    /// Number of checks since the record last held stable weights;
    /// used to cap venue re-fetches for long-stable records
    #[serde(default)]
    pub stable_checks: u32,
}

fn default_weight_status() -> String {
    "None".to_string()
}

fn default_confidence() -> String {
    "none".to_string()
}

impl RepoRecord {
    /// Create a record from discovery metadata. Starts in `NoWeights`
    /// with both bookkeeping dates set to `today`.
    pub fn new(full_name: &str, today: NaiveDate) -> Self {
        let name = full_name
            .rsplit('/')
            .next()
            .unwrap_or(full_name)
            .to_string();
        Self {
            full_name: full_name.to_string(),
            name,
            stars: 0,
            url: format!("https://github.com/{}", full_name),
            description: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
            status: RepoState::NoWeights,
            previous_status: None,
            last_checked: today,
            status_changed_date: today,
            weight_status: default_weight_status(),
            weight_confidence: default_confidence(),
            weight_details: Vec::new(),
            conference: None,
            conference_year: None,
            arxiv_id: None,
            conference_details: Vec::new(),
            topics: Vec::new(),
            coming_soon_detected: false,
            coming_soon_details: Vec::new(),
            ru_candidate: false,
            stable_checks: 0,
        }
    }

    /// Apply a state transition, tracking the change.
    ///
    /// `previous_status` and `status_changed_date` move only when the
    /// state actually changes; `last_checked` always advances.
    pub fn update_status(&mut self, new_status: RepoState, today: NaiveDate) {
        if self.status != new_status {
            self.previous_status = Some(self.status);
            self.status = new_status;
            self.status_changed_date = today;
            self.stable_checks = 0;
        }
        self.last_checked = today;
    }

    /// Advance `last_checked` without re-evaluating the state.
    pub fn touch(&mut self, today: NaiveDate) {
        self.last_checked = today;
    }

    /// A fresh release is a repository that *transitioned* into
    /// `HasWeights` within the window. Records that have held weights
    /// since creation (no observed transition) are never fresh.
    pub fn is_fresh_release(&self, today: NaiveDate, window_days: i64) -> bool {
        if self.status != RepoState::HasWeights {
            return false;
        }
        if self.previous_status.is_none() {
            return false;
        }
        (today - self.status_changed_date).num_days() <= window_days
    }
}
