use std::time::Duration;

use askdb_core::error::{AskDbError, Result};
use askdb_llm::{CompletionClient, CompletionRequest};

/// Run one completion under a deadline.
pub(crate) async fn complete_within(
    client: &dyn CompletionClient,
    request: CompletionRequest,
    limit: Duration,
    operation: &str,
) -> Result<String> {
    match tokio::time::timeout(limit, client.complete(request)).await {
        Ok(reply) => reply.map_err(AskDbError::from),
        Err(_) => Err(AskDbError::Timeout {
            operation: operation.to_string(),
            secs: limit.as_secs(),
        }),
    }
}
