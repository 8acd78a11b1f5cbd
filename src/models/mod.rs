// src/models/mod.rs

//! Domain models for the tracker application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod queue;
mod repo;

// Re-export all public types
pub use config::{Config, DetectionConfig, GithubConfig, RelevanceConfig, SearchConfig};
pub use queue::{CandidateEntry, CandidateSource, CandidateStatus};
pub use repo::{RepoRecord, RepoState};
