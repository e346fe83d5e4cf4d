//! Completion client trait.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::LlmResult;

/// A single-prompt completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
        }
    }
}

/// Trait that all completion backends implement.
///
/// Calls are independent; a client keeps no conversation history.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Complete `request.prompt`, returning the raw generated text.
    async fn complete(&self, request: CompletionRequest) -> LlmResult<String>;
}
