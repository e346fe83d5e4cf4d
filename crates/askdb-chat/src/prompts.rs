//! Prompt builders. Pure string formatting, no I/O.

use askdb_core::types::{QueryResult, SchemaDescriptor};

/// Prompt asking for exactly one SELECT over `schema`.
pub fn sql_prompt(schema: &SchemaDescriptor, question: &str) -> String {
    format!(
        "You are an AI assistant that writes SQLite SELECT queries against the following database schema:\n\
         {schema}\n\
         \n\
         User Question: \"{question}\"\n\
         \n\
         Respond with only a valid SELECT query and nothing else.",
        schema = schema.render(),
        question = question,
    )
}

/// Conversational prompt with no schema context.
pub fn chat_prompt(question: &str) -> String {
    format!("Friendly response to: {}", question)
}

/// Prompt asking for a short summary of `result` in answer to `question`.
pub fn answer_prompt(question: &str, sql: &str, result: &QueryResult) -> String {
    let rows = if result.is_empty() {
        "(no rows)".to_string()
    } else {
        result.render_lines()
    };
    format!(
        "You are a data analyst bot.\n\
         \n\
         SQL Query:\n\
         {sql}\n\
         \n\
         Query Result:\n\
         {rows}\n\
         \n\
         Answer the user's question briefly:\n\
         \"{question}\"",
    )
}
