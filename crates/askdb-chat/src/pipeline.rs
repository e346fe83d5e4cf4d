//! One inbound message in, one response envelope out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use askdb_core::config::AskDbConfig;
use askdb_core::error::AskDbError;
use askdb_llm::{CompletionClient, CompletionRequest};
use askdb_storage::{DatabaseRegistry, QueryExecutor};

use crate::call::complete_within;
use crate::error::ChatError;
use crate::generator::{no_database_error, QueryGenerator};
use crate::prompts;
use crate::synthesizer::AnswerSynthesizer;
use crate::types::{ExchangeData, InboundMessage, Mode, ResponseEnvelope, SessionExchange};

/// Shared by every session; holds no per-connection state.
pub struct ExchangePipeline {
    registry: Arc<DatabaseRegistry>,
    client: Arc<dyn CompletionClient>,
    generator: QueryGenerator,
    executor: QueryExecutor,
    synthesizer: AnswerSynthesizer,
    chat_temperature: f32,
    completion_timeout: Duration,
    max_message_chars: usize,
}

impl ExchangePipeline {
    pub fn new(
        registry: Arc<DatabaseRegistry>,
        client: Arc<dyn CompletionClient>,
        config: &AskDbConfig,
    ) -> Self {
        let completion_timeout = Duration::from_secs(config.llm.timeout_secs);
        Self {
            generator: QueryGenerator::new(
                Arc::clone(&client),
                config.llm.sql_temperature,
                completion_timeout,
            ),
            executor: QueryExecutor::new(Duration::from_secs(config.database.query_timeout_secs)),
            synthesizer: AnswerSynthesizer::new(
                Arc::clone(&client),
                config.llm.answer_temperature,
                completion_timeout,
                config.session.fallback_answer.clone(),
            ),
            registry,
            client,
            chat_temperature: config.llm.chat_temperature,
            completion_timeout,
            max_message_chars: config.session.max_message_chars,
        }
    }

    /// Parse and process one raw text frame.
    pub async fn handle_text(&self, text: &str) -> ResponseEnvelope {
        match read_frame(text) {
            Ok(inbound) => self.handle_message(inbound).await,
            Err(rejected) => rejected,
        }
    }

    pub async fn handle_message(&self, inbound: InboundMessage) -> ResponseEnvelope {
        let mut exchange = SessionExchange::begin(&inbound);
        info!(exchange_id = %exchange.id, mode = %exchange.data.mode, "Exchange started");

        if let Err(e) = self.run(&mut exchange).await {
            match &e {
                ChatError::Pipeline(AskDbError::UnsafeQuery { .. }) => {
                    warn!(exchange_id = %exchange.id, error = %e, "Exchange blocked")
                }
                ChatError::Pipeline(AskDbError::Execution(_)) => {
                    error!(exchange_id = %exchange.id, error = %e, "Exchange failed")
                }
                _ => warn!(exchange_id = %exchange.id, error = %e, "Exchange failed"),
            }
            exchange.fail(e);
        }

        let elapsed = Utc::now() - exchange.started_at;
        info!(
            exchange_id = %exchange.id,
            elapsed_ms = elapsed.num_milliseconds(),
            failed = exchange.error.is_some(),
            "Exchange finished"
        );
        exchange.into_envelope()
    }

    fn validate(&self, question: &str) -> Result<(), ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if question.chars().count() > self.max_message_chars {
            return Err(ChatError::MessageTooLong(self.max_message_chars));
        }
        Ok(())
    }

    async fn run(&self, exchange: &mut SessionExchange) -> Result<(), ChatError> {
        self.validate(exchange.question())?;
        let question = exchange.question().to_string();

        match exchange.mode {
            Mode::General => {
                let reply = complete_within(
                    self.client.as_ref(),
                    CompletionRequest::new(prompts::chat_prompt(&question), self.chat_temperature),
                    self.completion_timeout,
                    "chat reply",
                )
                .await?;
                exchange.data.llm_response = Some(reply.trim().to_string());
            }
            Mode::Database => {
                // One snapshot for the whole exchange, so schema and
                // connection always come from the same configuration.
                let snapshot = self.registry.snapshot();
                let sql = self
                    .generator
                    .generate(&question, snapshot.as_ref().map(|s| s.schema.as_ref()))
                    .await?;
                exchange.data.sql_query = Some(sql.clone());

                let snapshot = snapshot.ok_or_else(no_database_error)?;
                let result = self
                    .executor
                    .execute(Arc::clone(&snapshot.database), &sql)
                    .await?;

                let answer = match self.synthesizer.synthesize(&question, &sql, &result).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(exchange_id = %exchange.id, error = %e, "Answer synthesis failed, using fallback");
                        self.synthesizer.fallback().to_string()
                    }
                };
                exchange.data.query_result = Some(result);
                exchange.data.llm_response = Some(answer);
            }
        }
        Ok(())
    }
}

/// Decode one raw frame, or build the envelope that rejects it.
pub(crate) fn read_frame(text: &str) -> Result<InboundMessage, ResponseEnvelope> {
    InboundMessage::parse(text).map_err(|e| {
        warn!(error = %e, "Rejected malformed message");
        ResponseEnvelope::error(ExchangeData::unparsed(), e.to_string())
    })
}
