//! Pretrained weight detection.
//!
//! Evidence tiers, strongest first: HuggingFace links, GitHub release
//! assets, cloud drive links, model file extensions near weight
//! keywords. The first tier with any evidence wins.

use regex::{Regex, RegexBuilder};

use crate::error::{AppError, Result};
use crate::models::DetectionConfig;

use super::{clip, slice_around};

/// Result of weight detection.
#[derive(Debug, Clone, Default)]
pub struct WeightVerdict {
    /// Source label: "HF", "Release", "Cloud", "Extension" or "None"
    pub status: String,
    /// Confidence tier: "high", "medium", "low" or "none"
    pub confidence: String,
    /// Evidence snippets (at most 3)
    pub details: Vec<String>,
}

impl WeightVerdict {
    fn none() -> Self {
        Self {
            status: "None".to_string(),
            confidence: "none".to_string(),
            details: Vec::new(),
        }
    }

    fn found(status: &str, confidence: &str, details: Vec<String>) -> Self {
        Self {
            status: status.to_string(),
            confidence: confidence.to_string(),
            details,
        }
    }

    /// Whether any weight evidence was found.
    pub fn has_weights(&self) -> bool {
        self.status != "None"
    }
}

/// Detect pretrained weights in documentation content.
pub struct WeightDetector {
    hf_patterns: Vec<Regex>,
    release_patterns: Vec<Regex>,
    cloud_patterns: Vec<(String, Vec<Regex>)>,
    model_extensions: Vec<String>,
    weight_keywords: Vec<String>,
}

fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::pattern(pattern, e))
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| compile(p)).collect()
}

impl WeightDetector {
    /// Compile detection patterns from config.
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let cloud_patterns = config
            .cloud_drives
            .iter()
            .map(|(drive, patterns)| Ok((drive.clone(), compile_all(patterns)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            hf_patterns: compile_all(&config.huggingface)?,
            release_patterns: compile_all(&config.github_release)?,
            cloud_patterns,
            model_extensions: config.model_extensions.clone(),
            weight_keywords: config
                .weight_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        })
    }

    /// Detect pretrained weights, strongest evidence tier first.
    pub fn detect(&self, content: &str) -> WeightVerdict {
        if content.is_empty() {
            return WeightVerdict::none();
        }

        if let Some(details) = collect_matches(&self.hf_patterns, content, "HF", 3) {
            return WeightVerdict::found("HF", "high", details);
        }

        if let Some(details) = collect_matches(&self.release_patterns, content, "Release", 3) {
            return WeightVerdict::found("Release", "high", details);
        }

        let mut cloud_details = Vec::new();
        for (drive, patterns) in &self.cloud_patterns {
            if let Some(details) = collect_matches(patterns, content, drive, 2) {
                cloud_details.extend(details);
            }
        }
        if !cloud_details.is_empty() {
            return WeightVerdict::found("Cloud", "medium", cloud_details);
        }

        let details = self.detect_extensions(content);
        if !details.is_empty() {
            return WeightVerdict::found("Extension", "low", details);
        }

        WeightVerdict::none()
    }

    /// Heuristic: a model file extension counts only when a weight
    /// keyword appears within 100 characters of it.
    fn detect_extensions(&self, content: &str) -> Vec<String> {
        let lower = content.to_lowercase();
        let mut details = Vec::new();

        'extensions: for ext in &self.model_extensions {
            let mut search_from = 0;
            while let Some(offset) = lower[search_from..].find(ext.as_str()) {
                let pos = search_from + offset;
                search_from = pos + ext.len();

                let context = slice_around(&lower, pos.saturating_sub(100), pos + 100);
                if !self.weight_keywords.iter().any(|kw| context.contains(kw)) {
                    continue;
                }

                // Pull the actual file name out of the original text.
                let snippet = slice_around(content, pos.saturating_sub(50), pos + 20);
                let file_pattern = format!(r"[\w\-.]+{}", regex::escape(ext));
                if let Ok(re) = compile(&file_pattern) {
                    if let Some(m) = re.find(snippet) {
                        details.push(format!("File: {}", m.as_str()));
                    }
                }

                if details.len() >= 3 {
                    break 'extensions;
                }
            }
        }

        details
    }
}

/// Collect up to `limit` evidence snippets for a pattern set.
fn collect_matches(
    patterns: &[Regex],
    content: &str,
    label: &str,
    limit: usize,
) -> Option<Vec<String>> {
    let mut details = Vec::new();
    for pattern in patterns {
        for m in pattern.find_iter(content).take(limit) {
            details.push(format!("{}: {}", label, clip(m.as_str(), 60)));
            if details.len() >= limit {
                return Some(details);
            }
        }
    }
    if details.is_empty() { None } else { Some(details) }
}
