// src/services/mod.rs

//! External service clients.

pub mod github;

pub use github::{GitHubClient, RateLimit, RepoHost, SearchRepo, SortOrder};
