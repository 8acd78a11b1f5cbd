//! Content classifiers over repository documentation.
//!
//! All detectors treat empty input as "no evidence" rather than an
//! error, so a failed README fetch degrades to an unknown that gets
//! re-checked on the next run.

mod coming_soon;
mod conference;
mod relevance;
mod weights;

pub use coming_soon::{ComingSoonDetector, ComingSoonVerdict};
pub use conference::{ConferenceDetector, ConferenceVerdict};
pub use relevance::RelevanceFilter;
pub use weights::{WeightDetector, WeightVerdict};

/// Clamp a byte index down to the nearest char boundary.
fn floor_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Slice `text` around `[start, end)`, clamped to char boundaries.
fn slice_around(text: &str, start: usize, end: usize) -> &str {
    let start = floor_boundary(text, start);
    let end = floor_boundary(text, end.min(text.len()));
    &text[start..end]
}

/// Truncate a snippet to at most `max` characters, appending an
/// ellipsis when shortened.
fn clip(snippet: &str, max: usize) -> String {
    if snippet.chars().count() <= max {
        snippet.to_string()
    } else {
        let short: String = snippet.chars().take(max).collect();
        format!("{}...", short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_around_multibyte() {
        let text = "모델 weights 다운로드";
        // Byte offsets inside the multibyte chars must not panic.
        let slice = slice_around(text, 1, text.len() + 10);
        assert!(slice.contains("weights"));
    }

    #[test]
    fn test_clip_short_and_long() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("0123456789abc", 10), "0123456789...");
    }
}
