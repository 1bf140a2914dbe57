//! Text generation module for notiond
//!
//! Prompt in, text out. Task-specific prompts are rendered by the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

mod error;
mod gemini;

pub use error::LlmError;
pub use gemini::GeminiClient;

use crate::config::GeminiConfig;

/// Stateless text generator - each call is independent
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Create the configured generator
pub fn create_generator(config: &GeminiConfig) -> Result<Arc<dyn TextGenerator>, LlmError> {
    debug!(model = %config.model, "create_generator: called");
    Ok(Arc::new(GeminiClient::from_config(config)?))
}
