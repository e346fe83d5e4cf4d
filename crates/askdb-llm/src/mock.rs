//! Scripted completion client for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{CompletionClient, CompletionRequest};
use crate::error::{LlmError, LlmResult};

/// Replays queued replies in order and records every request it receives.
///
/// When the queue runs dry, `complete` fails with [`LlmError::Other`].
#[derive(Debug, Default)]
pub struct MockCompletion {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    pub fn with_error(self, err: LlmError) -> Self {
        self.push(Err(err));
        self
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, reply: LlmResult<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| {
                Err(LlmError::Other {
                    message: "no scripted reply".to_string(),
                })
            })
    }
}
