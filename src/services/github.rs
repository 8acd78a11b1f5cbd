// src/services/github.rs

//! GitHub API client with rate limiting.
//!
//! All discovery and documentation fetches go through here. The client
//! keeps a rate-limit budget updated from response headers, pauses when
//! the budget runs low, and retries transient failures with capped
//! exponential backoff. Per-repository failures degrade to empty
//! results instead of aborting a run.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Result;
use crate::models::{Config, RepoRecord};

const BASE_URL: &str = "https://api.github.com";

/// Retry backoff in seconds: exponential, capped at 64s so large
/// `max_retries` values cannot overflow the shift or stall a run.
fn backoff_secs(attempt: u32) -> u64 {
    1u64 << attempt.min(6)
}

/// Sort order for a discovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// GitHub's relevance ranking
    BestMatch,
    /// Popularity descending
    Stars,
    /// Recency of update descending
    Updated,
}

impl SortOrder {
    fn as_param(&self) -> Option<&'static str> {
        match self {
            SortOrder::BestMatch => None,
            SortOrder::Stars => Some("stars"),
            SortOrder::Updated => Some("updated"),
        }
    }
}

/// Repository metadata returned by a discovery pass.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRepo {
    pub full_name: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "stargazers_count")]
    pub stars: u32,

    #[serde(default, rename = "html_url")]
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,

    #[serde(default)]
    pub topics: Vec<String>,
}

impl RepoRecord {
    /// Refresh the metadata fields that change between discoveries.
    pub fn apply_metadata(&mut self, repo: &SearchRepo) {
        if !repo.name.is_empty() {
            self.name = repo.name.clone();
        }
        if !repo.url.is_empty() {
            self.url = repo.url.clone();
        }
        self.stars = repo.stars;
        self.description = repo
            .description
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(150)
            .collect();
        self.created_at = date_part(&repo.created_at);
        self.updated_at = date_part(&repo.updated_at);
        if !repo.topics.is_empty() {
            self.topics = repo.topics.clone();
        }
    }
}

/// Trim an ISO-8601 timestamp to date granularity.
fn date_part(timestamp: &str) -> String {
    timestamp.chars().take(10).collect()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchRepo>,
}

#[derive(Debug, Deserialize)]
struct ReadmeResponse {
    #[serde(default)]
    content: String,
}

/// Decode the contents-API payload (base64 with embedded newlines).
fn decode_readme(content: &str) -> String {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    match BASE64.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

/// Rate limit budget, updated from response headers.
#[derive(Debug, Clone)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
    pub reset: Option<DateTime<Utc>>,
}

impl Default for RateLimit {
    fn default() -> Self {
        // Unauthenticated default until the first response arrives.
        Self {
            limit: 60,
            remaining: 60,
            reset: None,
        }
    }
}

/// Discovery and documentation capability consumed by the engine.
///
/// The concrete implementation is [`GitHubClient`]; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// One discovery pass: a query under one sort order.
    async fn search_repos(
        &self,
        query: &str,
        min_stars: u32,
        created_after: &str,
        max_results: usize,
        sort: SortOrder,
    ) -> Result<Vec<SearchRepo>>;

    /// Fetch documentation text. Empty string on any failure.
    async fn get_readme(&self, owner: &str, name: &str) -> String;
}

/// GitHub API client.
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    rate_limit: Mutex<RateLimit>,
    request_delay: Duration,
    rate_limit_buffer: u32,
    max_retries: u32,
}

impl GitHubClient {
    /// Build a client from configuration. The token comes from config
    /// or the `GITHUB_TOKEN` env var.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.search.user_agent)
            .timeout(Duration::from_secs(config.search.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            token: config.github.resolve_token(),
            rate_limit: Mutex::new(RateLimit::default()),
            request_delay: Duration::from_millis(config.search.request_delay_ms),
            rate_limit_buffer: config.search.rate_limit_buffer,
            max_retries: config.search.max_retries.max(1),
        })
    }

    /// Current budget snapshot.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit.lock().map(|rl| rl.clone()).unwrap_or_default()
    }

    fn update_rate_limit(&self, headers: &HeaderMap) {
        let parse = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
        };

        if let Ok(mut rl) = self.rate_limit.lock() {
            if let Some(limit) = parse("x-ratelimit-limit") {
                rl.limit = limit as u32;
            }
            if let Some(remaining) = parse("x-ratelimit-remaining") {
                rl.remaining = remaining as u32;
            }
            if let Some(reset) = parse("x-ratelimit-reset") {
                rl.reset = DateTime::from_timestamp(reset, 0);
            }
        }
    }

    /// Sleep until the budget recovers when it is below the floor.
    async fn wait_for_rate_limit(&self) {
        let (remaining, reset) = {
            let rl = self.rate_limit.lock().map(|rl| rl.clone()).unwrap_or_default();
            (rl.remaining, rl.reset)
        };

        if remaining >= self.rate_limit_buffer {
            return;
        }
        let Some(reset) = reset else { return };

        let wait = (reset - Utc::now()).num_seconds();
        if wait > 0 {
            log::warn!(
                "Rate limit low ({} remaining). Waiting {}s until reset...",
                remaining,
                wait
            );
            tokio::time::sleep(Duration::from_secs(wait as u64 + 1)).await;
        }
    }

    /// Make a request with rate limiting and bounded retries.
    ///
    /// Returns `None` for not-found, exhausted retries, and anything
    /// else that should read as "no data" rather than a run failure.
    async fn request<T: DeserializeOwned>(&self, url: Url) -> Option<T> {
        self.wait_for_rate_limit().await;

        for attempt in 0..self.max_retries {
            let mut builder = self
                .client
                .get(url.clone())
                .header("Accept", "application/vnd.github+json");
            if let Some(token) = &self.token {
                builder = builder.header("Authorization", format!("token {}", token));
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    let wait = backoff_secs(attempt);
                    log::warn!("Network error: {}. Retrying in {}s...", e, wait);
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    continue;
                }
            };

            self.update_rate_limit(response.headers());
            let status = response.status();

            if status.is_success() {
                return response.json::<T>().await.ok();
            }

            if status == StatusCode::NOT_FOUND {
                return None;
            }

            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                // Primary rate limit: wait out the reset window.
                let reset = self.rate_limit.lock().ok().and_then(|rl| rl.reset);
                if let Some(reset) = reset {
                    let wait = (reset - Utc::now()).num_seconds();
                    if wait > 0 && wait < 3600 {
                        log::warn!("Rate limited. Waiting {}s...", wait);
                        tokio::time::sleep(Duration::from_secs(wait as u64 + 1)).await;
                        continue;
                    }
                }

                // Secondary limit (abuse detection): honor Retry-After.
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                if let Some(wait) = retry_after {
                    log::warn!("Secondary rate limit. Waiting {}s...", wait);
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    continue;
                }

                log::warn!("Rate limit error: {}", status);
                return None;
            }

            if status.is_server_error() {
                let wait = backoff_secs(attempt);
                log::warn!("Server error {}. Retrying in {}s...", status, wait);
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            log::warn!("HTTP error {} for {}", status, url);
            return None;
        }

        None
    }

    /// Sequential pacing between API calls.
    async fn pace(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }
}

#[async_trait]
impl RepoHost for GitHubClient {
    async fn search_repos(
        &self,
        query: &str,
        min_stars: u32,
        created_after: &str,
        max_results: usize,
        sort: SortOrder,
    ) -> Result<Vec<SearchRepo>> {
        let full_query = format!(
            "{} in:name,description,readme stars:>={} created:>={}",
            query, min_stars, created_after
        );
        let per_page = max_results.min(100).to_string();

        let mut params = vec![
            ("q", full_query.as_str()),
            ("per_page", per_page.as_str()),
            ("page", "1"),
        ];
        if let Some(sort_param) = sort.as_param() {
            params.push(("sort", sort_param));
            params.push(("order", "desc"));
        }

        let url = Url::parse_with_params(&format!("{}/search/repositories", BASE_URL), &params)?;
        let result: Option<SearchResponse> = self.request(url).await;
        self.pace().await;

        Ok(result.map(|r| r.items).unwrap_or_default())
    }

    async fn get_readme(&self, owner: &str, name: &str) -> String {
        let Ok(url) = Url::parse(&format!("{}/repos/{}/{}/readme", BASE_URL, owner, name)) else {
            return String::new();
        };
        let result: Option<ReadmeResponse> = self.request(url).await;
        self.pace().await;

        result
            .map(|r| decode_readme(&r.content))
            .unwrap_or_default()
    }
}
