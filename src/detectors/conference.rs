//! Venue and paper identifier detection.

use regex::{Regex, RegexBuilder};

use crate::error::{AppError, Result};
use crate::models::DetectionConfig;

use super::slice_around;

/// Result of venue detection.
#[derive(Debug, Clone, Default)]
pub struct ConferenceVerdict {
    pub conference: Option<String>,
    pub year: Option<String>,
    pub arxiv_id: Option<String>,
    pub details: Vec<String>,
}

/// Detect venue mentions and arXiv identifiers in documentation.
pub struct ConferenceDetector {
    venue_patterns: Vec<(String, Vec<Regex>)>,
    arxiv_pattern: Regex,
    year_pattern: Regex,
}

impl ConferenceDetector {
    /// Compile venue patterns from config. Each venue keyword matches
    /// with an optional quoted or adjacent four-digit year.
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let venue_patterns = config
            .conferences
            .iter()
            .map(|(venue, keywords)| {
                let patterns = keywords
                    .iter()
                    .map(|kw| {
                        let pattern =
                            format!(r#"\b{}(?:\s*['"]?\s*(\d{{4}}))?"#, regex::escape(kw));
                        RegexBuilder::new(&pattern)
                            .case_insensitive(true)
                            .build()
                            .map_err(|e| AppError::pattern(&pattern, e))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((venue.clone(), patterns))
            })
            .collect::<Result<Vec<_>>>()?;

        let arxiv_pattern = RegexBuilder::new(&config.arxiv_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::pattern(&config.arxiv_pattern, e))?;

        // Fallback year scan around a venue mention.
        let year_pattern = Regex::new(r"20[2-3]\d").map_err(|e| AppError::pattern("year", e))?;

        Ok(Self {
            venue_patterns,
            arxiv_pattern,
            year_pattern,
        })
    }

    /// Detect the venue. The repo description is searched along with
    /// the documentation since badges often live there. Empty
    /// documentation means no evidence, even if the description alone
    /// would match.
    pub fn detect(&self, content: &str, description: &str) -> ConferenceVerdict {
        if content.is_empty() {
            return ConferenceVerdict::default();
        }

        let text = format!("{}\n{}", description, content);
        let mut verdict = ConferenceVerdict::default();

        'venues: for (venue, patterns) in &self.venue_patterns {
            for pattern in patterns {
                if let Some(caps) = pattern.captures(&text) {
                    let whole = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
                    verdict.conference = Some(venue.clone());
                    verdict.year = caps.get(1).map(|m| m.as_str().to_string());

                    if verdict.year.is_none() {
                        // Look for a year in the surrounding context.
                        let m = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
                        let context = slice_around(&text, m.0.saturating_sub(20), m.1 + 20);
                        verdict.year = self
                            .year_pattern
                            .find(context)
                            .map(|y| y.as_str().to_string());
                    }

                    verdict.details.push(format!("{}: {}", venue, whole));
                    break 'venues;
                }
            }
        }

        if let Some(caps) = self.arxiv_pattern.captures(&text) {
            if let Some(id) = caps.get(1) {
                verdict.arxiv_id = Some(id.as_str().to_string());
                verdict.details.push(format!("arXiv: {}", id.as_str()));
            }
        }

        verdict
    }
}
