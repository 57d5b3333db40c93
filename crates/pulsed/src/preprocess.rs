//! Deterministic feedback preprocessing.
//!
//! Pure functions of their inputs: no I/O, no randomness. The confidence step
//! function here is load-bearing - the extractor later overwrites whatever
//! confidence the model claims with the value computed from input volume.

use pulse_common::Confidence;
use std::collections::{BTreeMap, HashSet};
use unicode_normalization::UnicodeNormalization;

/// Poll summary sentinel when no poll mapping was supplied
pub const NO_POLL_DATA: &str = "No poll data provided.";

/// Poll summary sentinel when every supplied poll was empty
pub const NO_VALID_POLL_DATA: &str = "No valid poll data.";

/// Derived, immutable analysis input.
#[derive(Debug, Clone)]
pub struct PreprocessedData {
    pub session_id: String,
    /// Deduplicated, NFKC-normalized entries in first-seen order. Contains no
    /// empty strings.
    pub cleaned_feedback: Vec<String>,
    /// One descriptive line per poll, newline-joined, or a sentinel.
    pub poll_summary: String,
    pub confidence: Confidence,
}

/// NFKC-normalize and trim a single entry.
pub fn normalize_text(text: &str) -> String {
    text.nfkc().collect::<String>().trim().to_string()
}

/// Summarize poll results as one line per poll, in sorted-name order.
///
/// Format per poll: `<name>: mean=<2dp>, median=<2dp>, count=<n>`.
pub fn summarize_polls(poll_stats: Option<&BTreeMap<String, Vec<i64>>>) -> String {
    let Some(polls) = poll_stats else {
        return NO_POLL_DATA.to_string();
    };
    if polls.is_empty() {
        return NO_POLL_DATA.to_string();
    }

    // BTreeMap iteration is already name-sorted, which keeps the summary
    // stable across submissions.
    let lines: Vec<String> = polls
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(name, values)| {
            format!(
                "{}: mean={:.2}, median={:.2}, count={}",
                name,
                mean(values),
                median(values),
                values.len()
            )
        })
        .collect();

    if lines.is_empty() {
        NO_VALID_POLL_DATA.to_string()
    } else {
        lines.join("\n")
    }
}

fn mean(values: &[i64]) -> f64 {
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

fn median(values: &[i64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Build [`PreprocessedData`] from an already-sanitized feedback batch.
///
/// Normalizes, deduplicates preserving first-seen order (empty strings after
/// normalization are discarded), computes volume confidence and the poll
/// summary.
pub fn preprocess(
    session_id: &str,
    safe_feedback: &[String],
    poll_stats: Option<&BTreeMap<String, Vec<i64>>>,
) -> PreprocessedData {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(safe_feedback.len());

    for entry in safe_feedback {
        let normalized = normalize_text(entry);
        if !normalized.is_empty() && seen.insert(normalized.clone()) {
            cleaned.push(normalized);
        }
    }

    let confidence = Confidence::from_volume(cleaned.len());
    let poll_summary = summarize_polls(poll_stats);

    PreprocessedData {
        session_id: session_id.to_string(),
        cleaned_feedback: cleaned,
        poll_summary,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let data = preprocess("s1", &strings(&["b", "a", "b", "c", "a"]), None);
        assert_eq!(data.cleaned_feedback, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_empty_after_trim_discarded() {
        let data = preprocess("s1", &strings(&["  ", "", "ok", "\t\n"]), None);
        assert_eq!(data.cleaned_feedback, vec!["ok"]);
    }

    #[test]
    fn test_nfkc_collapses_compatibility_forms() {
        // Fullwidth "ＡＢＣ" normalizes to "ABC" and deduplicates against it.
        let data = preprocess("s1", &strings(&["ＡＢＣ", "ABC"]), None);
        assert_eq!(data.cleaned_feedback, vec!["ABC"]);
    }

    #[test]
    fn test_confidence_from_deduplicated_count() {
        // 4 raw entries but only 2 distinct: low, not medium.
        let data = preprocess("s1", &strings(&["a", "a", "b", "b"]), None);
        assert_eq!(data.confidence, Confidence::Low);

        let many: Vec<String> = (0..15).map(|i| format!("entry {}", i)).collect();
        assert_eq!(preprocess("s1", &many, None).confidence, Confidence::High);
    }

    #[test]
    fn test_poll_summary_format() {
        let mut polls = BTreeMap::new();
        polls.insert("understanding".to_string(), vec![4, 5, 5]);
        let summary = summarize_polls(Some(&polls));
        assert_eq!(summary, "understanding: mean=4.67, median=5.00, count=3");
    }

    #[test]
    fn test_poll_summary_even_count_median() {
        let mut polls = BTreeMap::new();
        polls.insert("pace".to_string(), vec![2, 4, 1, 3]);
        let summary = summarize_polls(Some(&polls));
        assert_eq!(summary, "pace: mean=2.50, median=2.50, count=4");
    }

    #[test]
    fn test_poll_summary_sorted_by_name() {
        let mut polls = BTreeMap::new();
        polls.insert("zeta".to_string(), vec![1]);
        polls.insert("alpha".to_string(), vec![2]);
        let summary = summarize_polls(Some(&polls));
        let first = summary.lines().next().unwrap();
        assert!(first.starts_with("alpha:"));
    }

    #[test]
    fn test_poll_sentinels() {
        assert_eq!(summarize_polls(None), NO_POLL_DATA);
        assert_eq!(summarize_polls(Some(&BTreeMap::new())), NO_POLL_DATA);

        let mut empty_poll = BTreeMap::new();
        empty_poll.insert("votes".to_string(), vec![]);
        assert_eq!(summarize_polls(Some(&empty_poll)), NO_VALID_POLL_DATA);
    }

    #[test]
    fn test_empty_poll_skipped_among_valid() {
        let mut polls = BTreeMap::new();
        polls.insert("empty".to_string(), vec![]);
        polls.insert("full".to_string(), vec![3, 3]);
        let summary = summarize_polls(Some(&polls));
        assert_eq!(summary, "full: mean=3.00, median=3.00, count=2");
    }
}
