//! askdb completion clients.
//!
//! A [`CompletionClient`] turns one prompt into one piece of text. The
//! production client talks to an OpenAI-compatible chat completions API;
//! [`MockCompletion`] replays scripted replies for tests.

pub mod client;
pub mod error;
pub mod mock;
pub mod openai;

pub use client::{CompletionClient, CompletionRequest};
pub use error::{LlmError, LlmResult};
pub use mock::MockCompletion;
pub use openai::OpenAiClient;
