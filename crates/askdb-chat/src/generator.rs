//! Query generation.
//!
//! Builds the SQL prompt from the current schema and the question, asks the
//! completion service for a query and strips code-fence markup from the
//! reply. Safety is not checked here; the executor gates every query.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use askdb_core::error::{AskDbError, Result};
use askdb_core::types::SchemaDescriptor;
use askdb_llm::{CompletionClient, CompletionRequest};

use crate::call::complete_within;
use crate::prompts;

/// Reported when a database question arrives before any configuration.
pub const NO_DATABASE_MESSAGE: &str =
    "No database configured. Configure a database connection before asking database questions.";

pub fn no_database_error() -> AskDbError {
    AskDbError::Generation(NO_DATABASE_MESSAGE.to_string())
}

pub struct QueryGenerator {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    timeout: Duration,
}

impl QueryGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, temperature: f32, timeout: Duration) -> Self {
        Self {
            client,
            temperature,
            timeout,
        }
    }

    /// Produce one candidate query for `question`.
    ///
    /// Fails without calling the service when `schema` is `None`.
    pub async fn generate(
        &self,
        question: &str,
        schema: Option<&SchemaDescriptor>,
    ) -> Result<String> {
        let schema = schema.ok_or_else(no_database_error)?;
        let prompt = prompts::sql_prompt(schema, question);
        debug!(tables = schema.tables.len(), client = self.client.name(), "Generating SQL");

        let raw = complete_within(
            self.client.as_ref(),
            CompletionRequest::new(prompt, self.temperature),
            self.timeout,
            "query generation",
        )
        .await?;

        let sql = strip_code_fences(&raw);
        if sql.is_empty() {
            return Err(AskDbError::Generation(
                "completion contained no query".to_string(),
            ));
        }
        info!(sql = %sql, "SQL query generated");
        Ok(sql)
    }
}

/// Remove Markdown code fences (```` ```sql ```` and ```` ``` ````) and
/// surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    raw.trim()
        .replace("```sql", "")
        .replace("```SQL", "")
        .replace("```", "")
        .trim()
        .to_string()
}
