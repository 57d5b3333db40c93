//! Property-based tests over randomized inputs.
//!
//! Uses a small seeded generator from the standard library rather than an
//! external property-test crate, to keep dev dependencies minimal.
//!
//! ## Invariants tested
//!
//! - cleaned_feedback never contains duplicates or over-limit entries
//! - cache keys are invariant under input permutation, sensitive to content
//! - assembled sentiment scores always land in [0.0, 1.0]

use pulse_common::Confidence;
use pulsed::cache::AnalysisCache;
use pulsed::extract;
use pulsed::preprocess;
use pulsed::redact;

/// Simple pseudo-random number generator for test inputs (xorshift64)
struct TestRng {
    state: u64,
}

impl TestRng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    /// Random ASCII string of the given length, drawn from a small alphabet
    /// so duplicates actually occur.
    fn next_string(&mut self, len: usize) -> String {
        const ALPHABET: &[u8] = b"abcde ";
        (0..len)
            .map(|_| ALPHABET[(self.next_u64() as usize) % ALPHABET.len()] as char)
            .collect()
    }
}

/// Fisher-Yates shuffle driven by the test RNG
fn shuffle<T>(rng: &mut TestRng, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.next_range(0, (i + 1) as u64) as usize;
        items.swap(i, j);
    }
}

mod cleaned_feedback_properties {
    use super::*;
    use std::collections::HashSet;

    /// cleaned_feedback contains no duplicates and no over-limit entry, for
    /// random batches including near-threshold lengths.
    #[test]
    fn test_no_duplicates_no_oversize() {
        let mut rng = TestRng::new(0x5eed);
        const LIMIT: usize = 50;

        for _ in 0..200 {
            let batch_len = rng.next_range(0, 40) as usize;
            let batch: Vec<String> = (0..batch_len)
                .map(|_| {
                    // Cluster lengths around the threshold.
                    let len = rng.next_range(0, (LIMIT + 10) as u64) as usize;
                    rng.next_string(len)
                })
                .collect();

            let safe = redact::sanitize_feedback(&batch, LIMIT);
            let data = preprocess::preprocess("s", &safe, None);

            let mut seen = HashSet::new();
            for entry in &data.cleaned_feedback {
                assert!(seen.insert(entry.clone()), "duplicate entry: {:?}", entry);
                assert!(entry.chars().count() <= LIMIT, "over-limit entry survived");
                assert!(!entry.is_empty(), "empty entry survived");
            }
        }
    }

    /// Confidence always follows the deduplicated count, whatever the input.
    #[test]
    fn test_confidence_matches_volume() {
        let mut rng = TestRng::new(42);

        for _ in 0..100 {
            let batch_len = rng.next_range(0, 30) as usize;
            let batch: Vec<String> = (0..batch_len)
                .map(|_| {
                    let len = rng.next_range(1, 12) as usize;
                    rng.next_string(len)
                })
                .collect();

            let data = preprocess::preprocess("s", &batch, None);
            assert_eq!(
                data.confidence,
                Confidence::from_volume(data.cleaned_feedback.len())
            );
        }
    }
}

mod cache_key_properties {
    use super::*;
    use std::collections::BTreeMap;

    /// Permuting feedback order or poll value order never changes the key.
    #[test]
    fn test_key_permutation_invariance() {
        let mut rng = TestRng::new(7);

        for _ in 0..100 {
            let n = rng.next_range(1, 12) as usize;
            let feedback: Vec<String> = (0..n)
                .map(|i| format!("{} {}", rng.next_string(8), i))
                .collect();

            let mut polls = BTreeMap::new();
            let poll_count = rng.next_range(0, 4) as usize;
            for p in 0..poll_count {
                let values: Vec<i64> = (0..rng.next_range(1, 8))
                    .map(|_| rng.next_range(1, 6) as i64)
                    .collect();
                polls.insert(format!("poll{}", p), values);
            }
            let polls = if polls.is_empty() { None } else { Some(polls) };

            let base = AnalysisCache::content_key(&feedback, polls.as_ref());

            let mut shuffled = feedback.clone();
            shuffle(&mut rng, &mut shuffled);
            let shuffled_polls = polls.clone().map(|p| {
                p.into_iter()
                    .map(|(k, mut v)| {
                        shuffle(&mut rng, &mut v);
                        (k, v)
                    })
                    .collect::<BTreeMap<_, _>>()
            });

            assert_eq!(
                base,
                AnalysisCache::content_key(&shuffled, shuffled_polls.as_ref())
            );
        }
    }

    /// Changing any single feedback string or poll value changes the key.
    #[test]
    fn test_key_content_sensitivity() {
        let mut rng = TestRng::new(99);

        for _ in 0..100 {
            let n = rng.next_range(1, 10) as usize;
            let feedback: Vec<String> = (0..n).map(|i| format!("entry {}", i)).collect();

            let mut polls = BTreeMap::new();
            polls.insert("scale".to_string(), vec![1, 2, 3]);

            let base = AnalysisCache::content_key(&feedback, Some(&polls));

            // Mutate one feedback string.
            let victim = rng.next_range(0, n as u64) as usize;
            let mut changed = feedback.clone();
            changed[victim].push('!');
            assert_ne!(base, AnalysisCache::content_key(&changed, Some(&polls)));

            // Mutate one poll value.
            let mut changed_polls = polls.clone();
            changed_polls.get_mut("scale").unwrap()[1] = 7;
            assert_ne!(
                base,
                AnalysisCache::content_key(&feedback, Some(&changed_polls))
            );
        }
    }
}

mod sentiment_properties {
    use super::*;
    use serde_json::json;

    /// Whatever number the model emits, the assembled score is in [0, 1].
    #[test]
    fn test_sentiment_always_clamped() {
        let mut rng = TestRng::new(0xface);

        for _ in 0..200 {
            // Spread raw scores across a wide range, including far outliers.
            let raw = (rng.next_u64() % 2001) as f64 / 100.0 - 10.0;
            let parsed = json!({ "sentiment_score": raw });
            let result = extract::assemble_response(&parsed, Confidence::Low, "s");
            assert!(
                (0.0..=1.0).contains(&result.sentiment_score),
                "raw={} produced {}",
                raw,
                result.sentiment_score
            );
        }
    }
}
