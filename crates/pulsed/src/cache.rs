//! Content-addressed result cache with LRU eviction and lazy TTL expiry.
//!
//! Keyed by a digest of the normalized request content, not by session:
//! two sessions submitting identical feedback share one analysis (each gets
//! its own session id stamped back in by the orchestrator). Constructed once
//! at startup and injected by reference - no module-level singleton - so
//! tests can substitute an isolated instance.

use lru::LruCache;
use pulse_common::AnalysisResponse;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheEntry {
    value: AnalysisResponse,
    expires_at: Instant,
}

/// Shared analysis cache. All operations take the single mutex, so LRU
/// reordering and TTL eviction appear atomic to concurrent requests.
pub struct AnalysisCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl AnalysisCache {
    pub fn new(maxsize: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(maxsize.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Derive the content hash for a request.
    ///
    /// Feedback is sorted lexicographically and poll value lists are sorted
    /// so that neither submission order nor poll iteration order affects
    /// cache identity; any content change produces a different key.
    pub fn content_key(
        feedback: &[String],
        poll_stats: Option<&BTreeMap<String, Vec<i64>>>,
    ) -> String {
        let mut sorted_feedback = feedback.to_vec();
        sorted_feedback.sort();

        // BTreeMap keeps poll names sorted; sort each value list as well.
        let canonical_polls: Option<BTreeMap<&String, Vec<i64>>> = poll_stats.map(|polls| {
            polls
                .iter()
                .map(|(name, values)| {
                    let mut sorted_values = values.clone();
                    sorted_values.sort_unstable();
                    (name, sorted_values)
                })
                .collect()
        });

        let payload = serde_json::json!({
            "feedback": sorted_feedback,
            "poll_stats": canonical_polls,
        });

        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Look up a cached analysis. Expired entries are evicted lazily here;
    /// a live hit is marked most-recently-used.
    pub async fn get(
        &self,
        feedback: &[String],
        poll_stats: Option<&BTreeMap<String, Vec<i64>>>,
    ) -> Option<AnalysisResponse> {
        let key = Self::content_key(feedback, poll_stats);
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(&key) {
            if Instant::now() < entry.expires_at {
                return Some(entry.value.clone());
            }
            debug!("Evicting expired cache entry {}", &key[..12]);
            entries.pop(&key);
        }

        None
    }

    /// Insert or overwrite an analysis under the request's content key.
    /// Inserting past capacity evicts the least-recently-used entry.
    pub async fn set(
        &self,
        feedback: &[String],
        poll_stats: Option<&BTreeMap<String, Vec<i64>>>,
        value: AnalysisResponse,
    ) {
        let key = Self::content_key(feedback, poll_stats);
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().await.put(key, entry);
    }

    /// Current number of entries, including any not-yet-evicted expired ones.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
