//! HTTP server for pulsed.

use crate::cache::AnalysisCache;
use crate::config::PulseConfig;
use crate::pipeline::Pipeline;
use crate::routes;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: Pipeline,
    pub cache: Arc<AnalysisCache>,
    pub config: PulseConfig,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pipeline: Pipeline, cache: Arc<AnalysisCache>, config: PulseConfig) -> Self {
        Self {
            pipeline,
            cache,
            config,
            start_time: Instant::now(),
        }
    }
}

/// Build the router. Separate from [`run`] so tests can drive it directly.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::analysis_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the HTTP server until the process is stopped.
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr.clone();
    let app = app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
