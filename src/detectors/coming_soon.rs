//! Detection of "weights promised but not yet released" language.

use regex::{Regex, RegexBuilder};

use crate::error::{AppError, Result};

use super::{clip, floor_boundary};

/// Promise phrasings worth watching for, with a short description of
/// what each one means.
const PROMISE_PATTERNS: &[(&str, &str)] = &[
    // Direct promises
    (
        r"code\s+(?:will\s+be|to\s+be)\s+released",
        "code will be released",
    ),
    (
        r"weights?\s+(?:will\s+be|to\s+be)\s+released",
        "weights will be released",
    ),
    (
        r"model\s+(?:will\s+be|to\s+be)\s+released",
        "model will be released",
    ),
    (
        r"checkpoint\s+(?:will\s+be|to\s+be)\s+released",
        "checkpoint will be released",
    ),
    (
        r"pretrained\s+(?:will\s+be|to\s+be)\s+released",
        "pretrained will be released",
    ),
    // Coming soon variants
    (
        r"(?:weights?|model|checkpoint|code)\s*(?::|is|are)?\s*coming\s+soon",
        "coming soon",
    ),
    (r"coming\s+soon\s*(?::|\.|!)", "coming soon"),
    (r"release\s+(?:coming\s+)?soon", "release soon"),
    (r"stay\s+tuned", "stay tuned"),
    // Unchecked checkboxes near weight-related terms
    (
        r"\[\s*\]\s*(?:.*?)(?:model|weights?|checkpoint|pretrained)",
        "unchecked: model/weights",
    ),
    (
        r"\[\s*\]\s*(?:.*?)(?:release|download)",
        "unchecked: release/download",
    ),
    // TBD patterns
    (r"(?:weights?|model|checkpoint)\s*(?::|is|are)?\s*TBD", "TBD"),
    (
        r"TBD\s*(?::|\.|!)?\s*(?:.*?)(?:weights?|model|checkpoint)",
        "TBD",
    ),
    // Work in progress
    (
        r"(?:weights?|model)\s*(?::|is|are)?\s*(?:WIP|work\s+in\s+progress)",
        "WIP",
    ),
    // Under preparation
    (
        r"(?:weights?|model|code)\s+(?:under|in)\s+preparation",
        "under preparation",
    ),
];

/// How far into the document to look. Promise language lives in the
/// intro/status section; checklists further down are mostly roadmaps.
const SCAN_WINDOW_BYTES: usize = 3000;

/// Result of coming-soon detection.
#[derive(Debug, Clone, Default)]
pub struct ComingSoonVerdict {
    pub detected: bool,
    pub details: Vec<String>,
}

/// Detect weight release promises in documentation content.
pub struct ComingSoonDetector {
    patterns: Vec<(Regex, &'static str)>,
}

impl ComingSoonDetector {
    pub fn new() -> Result<Self> {
        let patterns = PROMISE_PATTERNS
            .iter()
            .map(|(pattern, description)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .map(|re| (re, *description))
                    .map_err(|e| AppError::pattern(*pattern, e))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Detect promise language in the document intro.
    pub fn detect(&self, content: &str) -> ComingSoonVerdict {
        if content.is_empty() {
            return ComingSoonVerdict::default();
        }

        let window = floor_boundary(content, SCAN_WINDOW_BYTES);
        let text = &content[..window];
        let mut details = Vec::new();

        for (pattern, description) in &self.patterns {
            if let Some(m) = pattern.find(text) {
                details.push(format!("{}: '{}'", description, clip(m.as_str(), 50)));
                if details.len() >= 3 {
                    break;
                }
            }
        }

        ComingSoonVerdict {
            detected: !details.is_empty(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ComingSoonDetector {
        ComingSoonDetector::new().unwrap()
    }

    #[test]
    fn test_will_be_released() {
        let verdict = detector().detect("Code will be released soon. Stay tuned!");
        assert!(verdict.detected);
        assert!(!verdict.details.is_empty());
    }

    #[test]
    fn test_unchecked_checkbox() {
        let verdict = detector().detect("## TODO\n- [ ] Release pretrained model\n- [x] Code");
        assert!(verdict.detected);
    }

    #[test]
    fn test_tbd() {
        assert!(detector().detect("Weights: TBD").detected);
    }

    #[test]
    fn test_coming_soon() {
        assert!(detector().detect("Model coming soon!").detected);
    }

    #[test]
    fn test_no_false_positive_on_released_weights() {
        let verdict = detector().detect("Download pretrained weights from the link below.");
        assert!(!verdict.detected);
    }

    #[test]
    fn test_empty_content() {
        assert!(!detector().detect("").detected);
    }

    #[test]
    fn test_promise_beyond_window_ignored() {
        let padding = "lorem ipsum ".repeat(300); // > 3000 bytes
        let content = format!("{}\nweights will be released", padding);
        assert!(!detector().detect(&content).detected);
    }

    #[test]
    fn test_detail_cap() {
        let content = "Code will be released. Weights will be released. \
                       Model will be released. Checkpoint will be released.";
        let verdict = detector().detect(content);
        assert!(verdict.detected);
        assert_eq!(verdict.details.len(), 3);
    }
}
