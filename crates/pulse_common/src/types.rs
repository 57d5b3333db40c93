//! Request and response types for the analysis API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Volume-based reliability label for an analysis.
///
/// Derived purely from how many distinct feedback entries survived
/// preprocessing - never from the model's own confidence claim. The fixed
/// thresholds are load-bearing: downstream consistency checks assume the
/// label is a deterministic function of input volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Map a deduplicated feedback count to a confidence label.
    ///
    /// `<3` low, `3..=14` medium, `>=15` high.
    pub fn from_volume(count: usize) -> Self {
        if count < 3 {
            Confidence::Low
        } else if count < 15 {
            Confidence::Medium
        } else {
            Confidence::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Incoming feedback batch for one classroom session.
///
/// Immutable once received. Field validation (non-empty feedback, item count
/// bounds) happens at the HTTP layer; the pipeline assumes a well-formed
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Opaque session identifier, echoed back in the response.
    pub session_id: String,
    /// Raw feedback entries in submission order.
    pub feedback: Vec<String>,
    /// Optional numeric poll results, keyed by poll name.
    #[serde(default)]
    pub poll_stats: Option<BTreeMap<String, Vec<i64>>>,
    /// Free-form client metadata. Ignored by the pipeline.
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// Structured analysis produced by the pipeline.
///
/// `session_id` and `processing_time_ms` are stamped by the orchestrator even
/// when the rest of the record comes out of the cache; all other fields are
/// shared verbatim across cache hits for identical content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub session_id: String,
    /// Overall sentiment in `[0, 1]`, clamped regardless of model output.
    pub sentiment_score: f64,
    pub themes: Vec<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub summary: String,
    pub confidence: Confidence,
    /// End-to-end wall-clock time including cache lookup. Near zero on a
    /// cache hit, which is an intentional observable signal.
    pub processing_time_ms: u64,
}

/// Payload for `GET /v1/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine: String,
    pub uptime_secs: u64,
    pub cache_entries: usize,
}
