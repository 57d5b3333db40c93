//! Error types for pulse.

use thiserror::Error;

/// Terminal errors the pipeline can surface to its caller.
///
/// Filter, preprocessing and prompt building never fail; only the
/// generation+extraction stage produces a hard failure. The pipeline either
/// succeeds with a complete [`crate::AnalysisResponse`] or fails once with a
/// clear cause - no partial results.
#[derive(Error, Debug)]
pub enum PulseError {
    /// The external generation engine failed. Never retried.
    #[error("engine error: {0}")]
    Engine(String),

    /// The model output contained no parseable JSON even after the repair
    /// retry was exhausted.
    #[error("model output contained no parseable JSON after {attempts} attempts")]
    UnparseableResponse { attempts: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
