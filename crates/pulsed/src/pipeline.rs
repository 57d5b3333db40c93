//! Analysis pipeline orchestration.
//!
//! Per request: cache check (short-circuit on hit), safety filter,
//! preprocessing, prompt build, generation, extraction, and a single bounded
//! repair retry on a parse miss. Engine failures are never retried. Timing is
//! measured end to end from request entry, so cache hits report near-zero
//! processing time - an intentional signal that a result came from cache.

use crate::cache::AnalysisCache;
use crate::engine::TextEngine;
use crate::extract::{self, Extraction};
use crate::preprocess;
use crate::prompt;
use crate::redact;
use pulse_common::{AnalysisResponse, FeedbackRequest, PulseError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Appended to the prompt before a repair retry.
const CORRECTIVE_DIRECTIVE: &str = "\nYou MUST return ONLY valid JSON. No other text.";

/// The pipeline and its injected collaborators. Built once at startup;
/// cheap to share across request handlers.
pub struct Pipeline {
    engine: Arc<dyn TextEngine>,
    cache: Arc<AnalysisCache>,
    system_prompt: String,
    max_entry_chars: usize,
    max_tokens: u32,
    /// Repair retries after the first generation attempt.
    max_retries: u32,
}

impl Pipeline {
    pub fn new(
        engine: Arc<dyn TextEngine>,
        cache: Arc<AnalysisCache>,
        system_prompt: String,
        max_entry_chars: usize,
        max_tokens: u32,
    ) -> Self {
        Self {
            engine,
            cache,
            system_prompt,
            max_entry_chars,
            max_tokens,
            max_retries: 1,
        }
    }

    /// Name of the engine behind the pipeline, for health reporting.
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Run the full analysis for one request.
    ///
    /// Succeeds with a complete [`AnalysisResponse`] or fails once with a
    /// clear cause; no partial results.
    pub async fn analyze(&self, request: &FeedbackRequest) -> Result<AnalysisResponse, PulseError> {
        let start = Instant::now();

        // Cache is keyed on the original request content, before any
        // filtering, so the lookup and the write-through below agree.
        if let Some(mut cached) = self
            .cache
            .get(&request.feedback, request.poll_stats.as_ref())
            .await
        {
            info!("Cache hit for session {}", request.session_id);
            cached.session_id = request.session_id.clone();
            cached.processing_time_ms = start.elapsed().as_millis() as u64;
            return Ok(cached);
        }

        let safe_feedback = redact::sanitize_feedback(&request.feedback, self.max_entry_chars);
        let preprocessed = preprocess::preprocess(
            &request.session_id,
            &safe_feedback,
            request.poll_stats.as_ref(),
        );

        let user_prompt = prompt::build_user_prompt(&preprocessed);
        let mut full_prompt = prompt::assemble(&self.system_prompt, &user_prompt);

        for attempt in 0..=self.max_retries {
            let raw_output = self.generate(full_prompt.clone()).await?;
            debug!(
                "Raw model output (first 500 chars): {:?}",
                raw_output.chars().take(500).collect::<String>()
            );

            match extract::extract_json(&raw_output) {
                Extraction::Extracted(parsed) => {
                    let mut result = extract::assemble_response(
                        &parsed,
                        preprocessed.confidence,
                        &request.session_id,
                    );
                    result.processing_time_ms = start.elapsed().as_millis() as u64;

                    self.cache
                        .set(
                            &request.feedback,
                            request.poll_stats.as_ref(),
                            result.clone(),
                        )
                        .await;

                    info!(
                        "Session {} analyzed in {} ms (attempt {})",
                        request.session_id,
                        result.processing_time_ms,
                        attempt + 1
                    );
                    return Ok(result);
                }
                Extraction::NoJson if attempt < self.max_retries => {
                    warn!(
                        "Attempt {} produced no parseable JSON, retrying with corrective directive",
                        attempt + 1
                    );
                    full_prompt.push_str(CORRECTIVE_DIRECTIVE);
                }
                Extraction::NoJson => {
                    return Err(PulseError::UnparseableResponse {
                        attempts: self.max_retries + 1,
                    });
                }
            }
        }

        unreachable!("retry loop always returns");
    }

    /// Run the blocking engine call on the worker pool so it cannot stall
    /// other in-flight requests' cheap stages.
    async fn generate(&self, prompt: String) -> Result<String, PulseError> {
        let engine = Arc::clone(&self.engine);
        let max_tokens = self.max_tokens;

        tokio::task::spawn_blocking(move || engine.generate(&prompt, max_tokens))
            .await
            .map_err(|e| PulseError::Engine(format!("generation task failed: {}", e)))?
    }
}
