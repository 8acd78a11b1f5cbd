//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API access settings
    #[serde(default)]
    pub github: GithubConfig,

    /// Search and pacing behavior
    #[serde(default)]
    pub search: SearchConfig,

    /// Search queries, one reconciliation pass pair per query
    #[serde(default = "defaults::queries")]
    pub queries: Vec<String>,

    /// Relevance gating keywords
    #[serde(default)]
    pub relevance: RelevanceConfig,

    /// Weight/venue detection patterns
    #[serde(default)]
    pub detection: DetectionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    ///
    /// A run with no queries configured cannot do anything useful, so
    /// that is rejected here before any I/O starts.
    pub fn validate(&self) -> Result<()> {
        if self.queries.is_empty() {
            return Err(AppError::validation("No search queries configured"));
        }
        if self.search.user_agent.trim().is_empty() {
            return Err(AppError::validation("search.user_agent is empty"));
        }
        if self.search.timeout_secs == 0 {
            return Err(AppError::validation("search.timeout_secs must be > 0"));
        }
        if self.search.max_results_per_query == 0 {
            return Err(AppError::validation(
                "search.max_results_per_query must be > 0",
            ));
        }
        if self.relevance.strong_keywords.is_empty() {
            return Err(AppError::validation("No strong relevance keywords defined"));
        }
        if self.detection.huggingface.is_empty() && self.detection.github_release.is_empty() {
            return Err(AppError::validation("No weight detection patterns defined"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            search: SearchConfig::default(),
            queries: defaults::queries(),
            relevance: RelevanceConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

/// GitHub API access settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GithubConfig {
    /// Personal access token; unauthenticated requests get 60/hour
    #[serde(default)]
    pub token: Option<String>,
}

impl GithubConfig {
    /// Resolve the token from config or the `GITHUB_TOKEN` env var.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }
}

/// Search behavior and request pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum star count for discovery
    #[serde(default = "defaults::min_stars")]
    pub min_stars: u32,

    /// Maximum results per query per pass
    #[serde(default = "defaults::max_results")]
    pub max_results_per_query: usize,

    /// Only discover repos created after this year
    #[serde(default = "defaults::year_filter")]
    pub year_filter: String,

    /// User-Agent header for API requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Pause when the remaining rate-limit budget drops below this
    #[serde(default = "defaults::rate_limit_buffer")]
    pub rate_limit_buffer: u32,

    /// Retry attempts for transient failures
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Stop re-fetching venue metadata for a stable record after this
    /// many checks (0 = refresh indefinitely)
    #[serde(default)]
    pub stable_recheck_limit: u32,

    /// Fresh-release window in days
    #[serde(default = "defaults::fresh_window")]
    pub fresh_window_days: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_stars: defaults::min_stars(),
            max_results_per_query: defaults::max_results(),
            year_filter: defaults::year_filter(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            rate_limit_buffer: defaults::rate_limit_buffer(),
            max_retries: defaults::max_retries(),
            stable_recheck_limit: 0,
            fresh_window_days: defaults::fresh_window(),
        }
    }
}

impl SearchConfig {
    /// Creation-date floor derived from the year filter.
    pub fn created_after(&self) -> String {
        format!("{}-01-01", self.year_filter)
    }
}

/// Keywords for the relevance gate applied to newly discovered repos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// Keywords that are sufficient on their own
    #[serde(default = "defaults::strong_keywords")]
    pub strong_keywords: Vec<String>,

    /// Keywords that need visual context to count
    #[serde(default = "defaults::weak_keywords")]
    pub weak_keywords: Vec<String>,

    /// Context terms that activate the weak keywords
    #[serde(default = "defaults::context_terms")]
    pub context_terms: Vec<String>,

    /// Keywords that reject a repo outright
    #[serde(default = "defaults::exclude_keywords")]
    pub exclude_keywords: Vec<String>,

    /// Name/description-prefix terms marking aggregator repos
    #[serde(default = "defaults::exclude_name_terms")]
    pub exclude_name_terms: Vec<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            strong_keywords: defaults::strong_keywords(),
            weak_keywords: defaults::weak_keywords(),
            context_terms: defaults::context_terms(),
            exclude_keywords: defaults::exclude_keywords(),
            exclude_name_terms: defaults::exclude_name_terms(),
        }
    }
}

/// Regex patterns for the content classifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// HuggingFace link patterns (highest confidence)
    #[serde(default = "defaults::huggingface_patterns")]
    pub huggingface: Vec<String>,

    /// GitHub release asset patterns (high confidence)
    #[serde(default = "defaults::release_patterns")]
    pub github_release: Vec<String>,

    /// Cloud drive patterns per provider (medium confidence)
    #[serde(default = "defaults::cloud_drives")]
    pub cloud_drives: BTreeMap<String, Vec<String>>,

    /// Model file extensions (low-confidence heuristic)
    #[serde(default = "defaults::model_extensions")]
    pub model_extensions: Vec<String>,

    /// Keywords that must appear near a model extension
    #[serde(default = "defaults::weight_keywords")]
    pub weight_keywords: Vec<String>,

    /// Venue name variants, keyed by canonical venue label
    #[serde(default = "defaults::conference_patterns")]
    pub conferences: BTreeMap<String, Vec<String>>,

    /// arXiv identifier extraction pattern (one capture group)
    #[serde(default = "defaults::arxiv_pattern")]
    pub arxiv_pattern: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            huggingface: defaults::huggingface_patterns(),
            github_release: defaults::release_patterns(),
            cloud_drives: defaults::cloud_drives(),
            model_extensions: defaults::model_extensions(),
            weight_keywords: defaults::weight_keywords(),
            conferences: defaults::conference_patterns(),
            arxiv_pattern: defaults::arxiv_pattern(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;

    // Search defaults
    pub fn min_stars() -> u32 {
        10
    }
    pub fn max_results() -> usize {
        20
    }
    pub fn year_filter() -> String {
        "2024".into()
    }
    pub fn user_agent() -> String {
        "paper-tracker/0.1".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn request_delay() -> u64 {
        1500
    }
    pub fn rate_limit_buffer() -> u32 {
        10
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn fresh_window() -> i64 {
        7
    }

    pub fn queries() -> Vec<String> {
        [
            "image restoration",
            "super resolution",
            "image denoising",
            "image deblurring",
            "low-light enhancement",
        ]
        .map(String::from)
        .to_vec()
    }

    // Relevance defaults
    pub fn strong_keywords() -> Vec<String> {
        [
            "super resolution",
            "super-resolution",
            "image restoration",
            "image denoising",
            "image deblurring",
            "image enhancement",
            "image inpainting",
            "low-light enhancement",
            "low light enhancement",
            "dehazing",
            "deraining",
            "demosaicing",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn weak_keywords() -> Vec<String> {
        [
            "denoising",
            "restoration",
            "enhancement",
            "deblurring",
            "upscaling",
            "inpainting",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn context_terms() -> Vec<String> {
        ["image", "photo", "picture", "visual"]
            .map(String::from)
            .to_vec()
    }
    pub fn exclude_keywords() -> Vec<String> {
        [
            "audio",
            "speech",
            "music",
            "point cloud",
            "language model",
            "text generation",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn exclude_name_terms() -> Vec<String> {
        [
            "awesome",
            "paper-list",
            "papers",
            "survey",
            "collection",
            "reading-list",
        ]
        .map(String::from)
        .to_vec()
    }

    // Detection defaults
    pub fn huggingface_patterns() -> Vec<String> {
        [
            r"huggingface\.co/[\w\-./]+",
            r"hf\.co/[\w\-./]+",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn release_patterns() -> Vec<String> {
        [
            r"github\.com/[\w\-.]+/[\w\-.]+/releases/download/[^\s)\]']+",
            r"releases/tag/[^\s)\]']+",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn cloud_drives() -> BTreeMap<String, Vec<String>> {
        let mut drives = BTreeMap::new();
        drives.insert(
            "GoogleDrive".to_string(),
            vec![r"drive\.google\.com/[^\s)\]']+".to_string()],
        );
        drives.insert(
            "BaiduPan".to_string(),
            vec![r"pan\.baidu\.com/[^\s)\]']+".to_string()],
        );
        drives.insert(
            "OneDrive".to_string(),
            vec![r"1drv\.ms/[^\s)\]']+".to_string()],
        );
        drives.insert(
            "Dropbox".to_string(),
            vec![r"dropbox\.com/[^\s)\]']+".to_string()],
        );
        drives
    }
    pub fn model_extensions() -> Vec<String> {
        [".pth", ".pt", ".ckpt", ".safetensors", ".onnx", ".pkl"]
            .map(String::from)
            .to_vec()
    }
    pub fn weight_keywords() -> Vec<String> {
        [
            "pretrained",
            "pre-trained",
            "checkpoint",
            "weights",
            "model zoo",
            "download",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn conference_patterns() -> BTreeMap<String, Vec<String>> {
        let entries: [(&str, &[&str]); 10] = [
            ("CVPR", &["CVPR"]),
            ("ICCV", &["ICCV"]),
            ("ECCV", &["ECCV"]),
            ("NeurIPS", &["NeurIPS", "NIPS"]),
            ("ICLR", &["ICLR"]),
            ("ICML", &["ICML"]),
            ("AAAI", &["AAAI"]),
            ("MICCAI", &["MICCAI"]),
            ("WACV", &["WACV"]),
            ("TPAMI", &["TPAMI", "T-PAMI"]),
        ];
        entries
            .iter()
            .map(|(venue, keywords)| {
                (
                    venue.to_string(),
                    keywords.iter().map(|k| k.to_string()).collect(),
                )
            })
            .collect()
    }
    pub fn arxiv_pattern() -> String {
        r"arxiv\.org/abs/(\d{4}\.\d{4,5})".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_queries() {
        let mut config = Config::default();
        config.queries.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.search.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_results() {
        let mut config = Config::default();
        config.search.max_results_per_query = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_created_after_from_year() {
        let config = Config::default();
        assert_eq!(config.search.created_after(), "2024-01-01");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            queries = ["video restoration"]

            [search]
            min_stars = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.queries, vec!["video restoration"]);
        assert_eq!(config.search.min_stars, 50);
        assert_eq!(config.search.max_results_per_query, 20);
        assert!(!config.relevance.strong_keywords.is_empty());
    }
}
