//! Pulse daemon - classroom feedback analysis service.
//!
//! Accepts feedback batches over HTTP, drives one local text-generation call
//! per distinct batch, and returns a structured sentiment/theme analysis.

use anyhow::Result;
use clap::Parser;
use pulsed::cache::AnalysisCache;
use pulsed::config::{PulseConfig, CONFIG_PATH};
use pulsed::engine;
use pulsed::pipeline::Pipeline;
use pulsed::prompt;
use pulsed::server::{self, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pulsed", version, about = "Classroom feedback analysis daemon")]
struct Args {
    /// Path to the config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over the configured level when set.
    let config = PulseConfig::load(&args.config)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("pulsed v{} starting", env!("CARGO_PKG_VERSION"));

    let engine = engine::from_config(&config.engine)?;
    info!("Engine strategy: {}", engine.name());

    let cache = Arc::new(AnalysisCache::new(
        config.cache.maxsize,
        Duration::from_secs(config.cache.ttl_seconds),
    ));

    let system_prompt = prompt::load_system_prompt(Path::new(&config.system_prompt_path));

    let pipeline = Pipeline::new(
        engine,
        Arc::clone(&cache),
        system_prompt,
        config.limits.max_entry_chars,
        config.engine.max_tokens,
    );

    let state = AppState::new(pipeline, cache, config);

    tokio::select! {
        result = server::run(state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down gracefully");
        }
    }

    Ok(())
}
