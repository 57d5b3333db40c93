//! API routes for pulsed.
//!
//! Request validation (non-empty feedback, item count bounds) lives here;
//! the pipeline assumes well-formed input. Pipeline failures map to 502 -
//! the analysis either completes or fails once with a clear cause.

use crate::server::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use pulse_common::{AnalysisResponse, FeedbackRequest, HealthResponse, PulseError};
use std::sync::Arc;
use tracing::error;

type AppStateArc = Arc<AppState>;

pub fn analysis_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/analyze", post(analyze))
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health))
}

async fn analyze(
    State(state): State<AppStateArc>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<AnalysisResponse>, (StatusCode, String)> {
    if request.feedback.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "feedback must contain at least one entry".to_string(),
        ));
    }

    let max_items = state.config.limits.max_feedback_items;
    if request.feedback.len() > max_items {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("feedback exceeds {} entries", max_items),
        ));
    }

    let result = state.pipeline.analyze(&request).await.map_err(|e| {
        error!("Analysis failed for session {}: {}", request.session_id, e);
        match e {
            PulseError::Engine(_) | PulseError::UnparseableResponse { .. } => {
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    })?;

    Ok(Json(result))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        engine: state.pipeline.engine_name().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        cache_entries: state.cache.len().await,
    })
}
