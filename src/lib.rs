// src/lib.rs

//! Paper Tracker Library
//!
//! Tracks GitHub repositories implementing low-level vision papers and
//! reconciles their pretrained-weight release state across runs.

pub mod detectors;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod services;
pub mod storage;

pub use error::{AppError, Result};
