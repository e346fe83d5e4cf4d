//! Answer synthesis.
//!
//! Turns a question, its query and the returned rows into a short answer.
//! Failures go back to the caller, which decides on the fallback text.

use std::sync::Arc;
use std::time::Duration;

use askdb_core::error::{AskDbError, Result};
use askdb_core::types::QueryResult;
use askdb_llm::{CompletionClient, CompletionRequest};

use crate::call::complete_within;
use crate::prompts;

/// Summarises an executed query's rows in natural language.
pub struct AnswerSynthesizer {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    timeout: Duration,
    fallback: String,
}

impl AnswerSynthesizer {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        temperature: f32,
        timeout: Duration,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            client,
            temperature,
            timeout,
            fallback: fallback.into(),
        }
    }

    /// Text used in place of a summary the service failed to produce.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub async fn synthesize(&self, question: &str, sql: &str, result: &QueryResult) -> Result<String> {
        let prompt = prompts::answer_prompt(question, sql, result);
        let answer = complete_within(
            self.client.as_ref(),
            CompletionRequest::new(prompt, self.temperature),
            self.timeout,
            "answer synthesis",
        )
        .await?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AskDbError::Generation("completion contained no answer".to_string()));
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdb_core::types::QueryRow;
    use askdb_llm::{LlmError, MockCompletion};
    use serde_json::json;

    fn synthesizer(mock: Arc<MockCompletion>) -> AnswerSynthesizer {
        AnswerSynthesizer::new(
            mock,
            0.7,
            Duration::from_secs(5),
            "Unable to generate a detailed answer at this time.",
        )
    }

    fn one_row() -> QueryResult {
        let mut row = QueryRow::new();
        row.insert("count".to_string(), json!(3));
        QueryResult::from_rows(vec![row])
    }

    #[tokio::test]
    async fn test_synthesize_trims_answer() {
        let mock = Arc::new(MockCompletion::new().with_reply("  There are 3 users.\n"));
        let answer = synthesizer(Arc::clone(&mock))
            .synthesize("how many users?", "SELECT COUNT(*) AS count FROM users", &one_row())
            .await
            .unwrap();

        assert_eq!(answer, "There are 3 users.");
        let request = &mock.requests()[0];
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert!(request.prompt.contains("{\"count\":3}"));
    }

    #[tokio::test]
    async fn test_service_failure_propagates() {
        let mock = Arc::new(MockCompletion::new().with_error(LlmError::NetworkError {
            message: "connection reset".to_string(),
        }));
        let synth = synthesizer(mock);
        let err = synth
            .synthesize("q", "SELECT 1", &QueryResult::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AskDbError::Generation(_)));
        assert_eq!(synth.fallback(), "Unable to generate a detailed answer at this time.");
    }

    #[tokio::test]
    async fn test_blank_answer_is_error() {
        let mock = Arc::new(MockCompletion::new().with_reply("   "));
        let err = synthesizer(mock)
            .synthesize("q", "SELECT 1", &QueryResult::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no answer"));
    }
}
