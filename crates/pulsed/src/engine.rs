//! Text-generation engine boundary.
//!
//! The pipeline talks to an opaque `generate(prompt, max_tokens) -> text`
//! function and never knows whether a real model or a stand-in is behind it.
//! The strategy is chosen once at startup from config.

use crate::config::EngineConfig;
use pulse_common::PulseError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Blocking text-generation engine.
///
/// `generate` may take seconds; callers must invoke it from a worker thread
/// (the pipeline uses `spawn_blocking`), never from the async scheduler.
pub trait TextEngine: Send + Sync {
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PulseError>;

    /// Short engine label for health reporting.
    fn name(&self) -> &'static str;
}

/// Select an engine strategy from configuration. Called once at startup.
pub fn from_config(config: &EngineConfig) -> Result<Arc<dyn TextEngine>, PulseError> {
    match config.mode.as_str() {
        "ollama" => Ok(Arc::new(OllamaEngine::new(config)?)),
        "mock" => Ok(Arc::new(MockEngine)),
        other => Err(PulseError::Config(format!(
            "unknown engine mode '{}' (expected 'ollama' or 'mock')",
            other
        ))),
    }
}

/// Ollama-backed engine using the non-streaming generate API.
pub struct OllamaEngine {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
}

impl OllamaEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, PulseError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PulseError::Engine(format!("failed to build HTTP client: {}", e)))?;

        info!(
            "Ollama engine: model={} endpoint={} timeout={}s",
            config.model, config.endpoint, config.timeout_secs
        );

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }
}

impl TextEngine for OllamaEngine {
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PulseError> {
        let url = format!("{}/api/generate", self.endpoint);

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "num_predict": max_tokens,
                "temperature": 0.1,
                "top_p": 0.9,
            }
        });

        debug!("Ollama call [{}] prompt: {} chars", self.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| PulseError::Engine(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PulseError::Engine(format!(
                "Ollama returned {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| PulseError::Engine(format!("bad response body: {}", e)))?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        debug!("Ollama answered with {} chars", text.len());
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// Stand-in engine for development runs without a model available.
///
/// Emits a fixed neutral analysis so the rest of the service can be exercised
/// end to end.
pub struct MockEngine;

impl TextEngine for MockEngine {
    fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, PulseError> {
        Ok(r#"{
  "sentiment_score": 0.5,
  "themes": ["general"],
  "strengths": [],
  "improvements": [],
  "summary": "Mock analysis - no model loaded."
}"#
        .to_string())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Scripted engine for tests: returns pre-queued outcomes in order, then
/// repeats the last one.
pub struct ScriptedEngine {
    responses: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    calls: Mutex<u32>,
}

impl ScriptedEngine {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    /// Engine that always returns the same text.
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Engine that always fails.
    pub fn always_error(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    /// Number of generate calls made so far.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl TextEngine for ScriptedEngine {
    fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, PulseError> {
        *self.calls.lock().unwrap() += 1;

        let mut queue = self.responses.lock().unwrap();
        let mut last = self.last.lock().unwrap();

        let outcome = match queue.pop_front() {
            Some(next) => {
                *last = Some(next.clone());
                next
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err("scripted engine has no responses".to_string())),
        };

        outcome.map_err(PulseError::Engine)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
