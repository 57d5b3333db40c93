//! Pulse daemon library - exposes modules for testing.

pub mod cache;
pub mod config;
pub mod engine;
pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod prompt;
pub mod redact;
pub mod routes;
pub mod server;
