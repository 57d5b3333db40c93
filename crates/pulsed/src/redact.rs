//! Feedback redaction and safety filtering.
//!
//! Removes high-confidence personal data from feedback entries before they
//! reach the prompt, and drops oversized entries outright. This stage never
//! fails - it only filters and masks.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// High-precision PII patterns with their placeholder tokens
static PII_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Email addresses
        (
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
            "[EMAIL REDACTED]",
        ),
        // Phone-number-shaped substrings (optional country code, separators)
        (
            Regex::new(r"\b(?:\+?\d{1,3}[-.]?)?\(?\d{3}\)?[-.]?\d{3}[-.]?\d{4}\b").unwrap(),
            "[PHONE REDACTED]",
        ),
    ]
});

/// Redact email addresses and phone numbers from a single entry.
pub fn redact_pii(text: &str) -> String {
    let mut result = text.to_string();

    for (pattern, replacement) in PII_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    result
}

/// Apply length filtering and PII redaction to a feedback batch.
///
/// Entries longer than `max_chars` are dropped - oversized payloads are the
/// usual vehicle for prompt injection and spam. Survivors keep their relative
/// order. Drops are counted and logged, never errors.
pub fn sanitize_feedback(feedback: &[String], max_chars: usize) -> Vec<String> {
    let mut clean = Vec::with_capacity(feedback.len());
    let mut dropped = 0usize;

    for entry in feedback {
        if entry.chars().count() > max_chars {
            dropped += 1;
            continue;
        }
        clean.push(redact_pii(entry));
    }

    if dropped > 0 {
        warn!("Dropped {} feedback entries over the length limit", dropped);
    }

    clean
}
