//! Relevance gate for newly discovered repositories.
//!
//! Applied only to repos not already in the record store; a repo that
//! was accepted once stays tracked.

use crate::models::RelevanceConfig;

/// Pure keyword predicate over repository name/description/topics.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    strong_keywords: Vec<String>,
    weak_keywords: Vec<String>,
    context_terms: Vec<String>,
    exclude_keywords: Vec<String>,
    exclude_name_terms: Vec<String>,
}

impl RelevanceFilter {
    pub fn new(config: &RelevanceConfig) -> Self {
        let lower = |terms: &[String]| terms.iter().map(|t| t.to_lowercase()).collect();
        Self {
            strong_keywords: lower(&config.strong_keywords),
            weak_keywords: lower(&config.weak_keywords),
            context_terms: lower(&config.context_terms),
            exclude_keywords: lower(&config.exclude_keywords),
            exclude_name_terms: lower(&config.exclude_name_terms),
        }
    }

    /// Whether the repo matches the tracked niche.
    ///
    /// Any strong keyword is enough; weak keywords count only together
    /// with a visual-context term.
    pub fn is_relevant(&self, name: &str, description: &str, topics: &[String]) -> bool {
        let text = format!(
            "{} {} {}",
            name.to_lowercase(),
            description.to_lowercase(),
            topics.join(" ").to_lowercase()
        );

        if self.exclude_keywords.iter().any(|kw| text.contains(kw)) {
            return false;
        }

        if self.strong_keywords.iter().any(|kw| text.contains(kw)) {
            return true;
        }

        let has_context = self.context_terms.iter().any(|ctx| text.contains(ctx));
        has_context && self.weak_keywords.iter().any(|kw| text.contains(kw))
    }

    /// Whether the repo is an aggregator (paper list, survey, ...)
    /// rather than an implementation.
    pub fn is_excluded(&self, name: &str, description: &str) -> bool {
        let name = name.to_lowercase();
        let description = description.to_lowercase();
        let prefix: String = description.chars().take(50).collect();

        for term in &self.exclude_name_terms {
            if name.contains(term) {
                return true;
            }
            if description.starts_with(term) || prefix.contains(&format!("a {}", term)) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelevanceConfig;

    fn filter() -> RelevanceFilter {
        RelevanceFilter::new(&RelevanceConfig::default())
    }

    #[test]
    fn test_strong_keyword_is_relevant() {
        assert!(filter().is_relevant("sr-net", "Image super resolution network", &[]));
    }

    #[test]
    fn test_weak_keyword_needs_context() {
        let f = filter();
        // "denoising" alone is not enough
        assert!(!f.is_relevant("denoiser", "A general denoising toolkit", &[]));
        // but with image context it is
        assert!(f.is_relevant("denoiser", "Image denoising toolkit", &[]));
    }

    #[test]
    fn test_audio_is_excluded() {
        assert!(!filter().is_relevant("audio-sr", "Audio super resolution", &[]));
    }

    #[test]
    fn test_topics_contribute() {
        assert!(filter().is_relevant("mystery-net", "", &["image-restoration".into(), "super resolution".into()]));
    }

    #[test]
    fn test_aggregator_name_excluded() {
        assert!(filter().is_excluded("awesome-super-resolution", "A list of SR papers"));
    }

    #[test]
    fn test_aggregator_description_prefix_excluded() {
        assert!(filter().is_excluded("sr-hub", "collection of super resolution methods"));
        assert!(filter().is_excluded("sr-hub", "This is a survey of restoration models"));
    }

    #[test]
    fn test_implementation_not_excluded() {
        assert!(!filter().is_excluded("restormer", "Official implementation of Restormer"));
    }

    #[test]
    fn test_deterministic() {
        let f = filter();
        let result = f.is_relevant("x", "image denoising", &[]);
        assert_eq!(result, f.is_relevant("x", "image denoising", &[]));
    }
}
