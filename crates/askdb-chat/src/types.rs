//! Session protocol types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use askdb_core::types::QueryResult;

use crate::error::ChatError;

/// Wire value selecting the database path.
pub const DATABASE_MODE: &str = "company";
/// Wire value used when the inbound message names no mode.
pub const DEFAULT_MODE: &str = "general";

fn default_mode() -> String {
    DEFAULT_MODE.to_string()
}

/// `{ "message": ..., "mode": "general" | "company" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl InboundMessage {
    pub fn new(message: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            mode: mode.into(),
        }
    }

    /// Parse one inbound text frame.
    pub fn parse(text: &str) -> Result<Self, ChatError> {
        serde_json::from_str(text).map_err(|e| ChatError::MalformedMessage(e.to_string()))
    }

    pub fn resolved_mode(&self) -> Mode {
        Mode::from_wire(&self.mode)
    }
}

/// How an exchange is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Conversational reply, no schema context.
    General,
    /// Generate, execute and summarise a query.
    Database,
}

impl Mode {
    /// Only the exact database mode value selects [`Mode::Database`].
    pub fn from_wire(mode: &str) -> Self {
        if mode == DATABASE_MODE {
            Mode::Database
        } else {
            Mode::General
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The `data` object of a response envelope. Absent parts serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeData {
    pub message: String,
    pub mode: String,
    pub sql_query: Option<String>,
    pub query_result: Option<QueryResult>,
    pub llm_response: Option<String>,
}

impl ExchangeData {
    /// Echo of a message whose payload could not be read.
    pub fn unparsed() -> Self {
        Self {
            mode: default_mode(),
            ..Self::default()
        }
    }
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: ResponseStatus,
    pub data: ExchangeData,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(data: ExchangeData) -> Self {
        Self {
            status: ResponseStatus::Success,
            data,
            error: None,
        }
    }

    pub fn error(data: ExchangeData, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            data,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Serialize for the wire.
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(text) => text,
            Err(e) => serde_json::json!({
                "status": "error",
                "data": null,
                "error": format!("failed to serialize response: {}", e),
            })
            .to_string(),
        }
    }
}

/// The unit of work for one inbound message.
#[derive(Debug, Clone)]
pub struct SessionExchange {
    pub id: Uuid,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub data: ExchangeData,
    pub error: Option<String>,
}

impl SessionExchange {
    pub fn begin(inbound: &InboundMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: inbound.resolved_mode(),
            started_at: Utc::now(),
            data: ExchangeData {
                message: inbound.message.clone(),
                mode: inbound.mode.clone(),
                ..ExchangeData::default()
            },
            error: None,
        }
    }

    pub fn question(&self) -> &str {
        &self.data.message
    }

    /// Record a failure; whatever was already attached stays.
    pub fn fail(&mut self, err: impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        match self.error {
            Some(message) => ResponseEnvelope::error(self.data, message),
            None => ResponseEnvelope::success(self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_defaults_mode_to_general() {
        let msg = InboundMessage::parse(r#"{"message":"hello"}"#).unwrap();
        assert_eq!(msg.mode, "general");
        assert_eq!(msg.resolved_mode(), Mode::General);
    }

    #[test]
    fn test_parse_company_mode() {
        let msg = InboundMessage::parse(r#"{"message":"how many users","mode":"company"}"#).unwrap();
        assert_eq!(msg.resolved_mode(), Mode::Database);
    }

    #[test]
    fn test_unknown_mode_treated_as_general() {
        assert_eq!(Mode::from_wire("sales"), Mode::General);
        assert_eq!(Mode::from_wire("Company"), Mode::General);
        assert_eq!(Mode::from_wire(""), Mode::General);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        for text in ["not json", "{}", r#"{"mode":"company"}"#, r#"{"message":null}"#, "[1,2]"] {
            let err = InboundMessage::parse(text).unwrap_err();
            assert!(matches!(err, ChatError::MalformedMessage(_)), "payload {}", text);
        }
    }

    #[test]
    fn test_success_envelope_shape() {
        let mut exchange = SessionExchange::begin(&InboundMessage::new("hello", "general"));
        exchange.data.llm_response = Some("Hi there!".to_string());
        let value = serde_json::to_value(exchange.into_envelope()).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "data": {
                    "message": "hello",
                    "mode": "general",
                    "sql_query": null,
                    "query_result": null,
                    "llm_response": "Hi there!"
                },
                "error": null
            })
        );
    }

    #[test]
    fn test_error_envelope_keeps_partial_progress() {
        let mut exchange = SessionExchange::begin(&InboundMessage::new("q", "company"));
        exchange.data.sql_query = Some("SELECT * FROM nope".to_string());
        exchange.fail("Execution error: no such table: nope");
        let envelope = exchange.into_envelope();

        assert!(!envelope.is_success());
        assert_eq!(envelope.data.sql_query.as_deref(), Some("SELECT * FROM nope"));
        assert_eq!(
            envelope.error.as_deref(),
            Some("Execution error: no such table: nope")
        );
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json()).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["data"]["query_result"], json!(null));
    }

    #[test]
    fn test_unparsed_data_echo() {
        let data = ExchangeData::unparsed();
        assert_eq!(data.message, "");
        assert_eq!(data.mode, "general");
    }
}
