//! Prompt construction for the analysis call.
//!
//! Renders a deterministic instruction+data prompt. The cache keys on raw
//! request content rather than the rendered prompt, so the template can
//! evolve without invalidating cached analyses.

use crate::preprocess::PreprocessedData;
use std::path::Path;
use tracing::warn;

// Phi-style role delimiters expected by the chat template.
const SYS_START: &str = "<|system|>";
const USR_START: &str = "<|user|>";
const ASST_START: &str = "<|assistant|>";
const TURN_END: &str = "<|end|>";

/// Minimal built-in instruction used when the configured prompt file is
/// missing.
const FALLBACK_SYSTEM_PROMPT: &str =
    "You are a classroom feedback analyst. Return a single JSON object and nothing else.";

/// Sentinel for sessions with no surviving text feedback
pub const NO_FEEDBACK: &str = "No text feedback provided.";

/// Load the system instruction from the configured file, falling back to the
/// built-in instruction if it cannot be read. Absence is non-fatal.
pub fn load_system_prompt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!(
                "System prompt {} unreadable ({}), using built-in fallback",
                path.display(),
                e
            );
            FALLBACK_SYSTEM_PROMPT.to_string()
        }
    }
}

/// Render the user-role message from preprocessed input.
pub fn build_user_prompt(data: &PreprocessedData) -> String {
    let feedback_block = if data.cleaned_feedback.is_empty() {
        NO_FEEDBACK.to_string()
    } else {
        data.cleaned_feedback
            .iter()
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "SESSION: {}\n\
         FEEDBACK COUNT: {}\n\n\
         FEEDBACK ENTRIES:\n{}\n\n\
         POLL STATISTICS:\n{}\n\n\
         Analyze the above and return valid JSON matching the schema.",
        data.session_id,
        data.cleaned_feedback.len(),
        feedback_block,
        data.poll_summary,
    )
}

/// Concatenate system and user messages into one generation-ready prompt.
pub fn assemble(system_prompt: &str, user_prompt: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
        SYS_START, system_prompt, TURN_END, USR_START, user_prompt, TURN_END, ASST_START
    )
}
