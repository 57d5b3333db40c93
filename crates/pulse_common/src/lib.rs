//! Shared types for the pulse feedback-analysis service.
//!
//! These types cross the HTTP boundary and are kept in their own crate so the
//! daemon and any future client binaries agree on the wire format.

pub mod error;
pub mod types;

pub use error::PulseError;
pub use types::{AnalysisResponse, Confidence, FeedbackRequest, HealthResponse};
