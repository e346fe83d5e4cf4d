use askdb_core::error::AskDbError;
use thiserror::Error;

/// Errors raised while talking to a completion service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Server error ({status}): {message}")]
    ServerError { message: String, status: u16 },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// The service answered but the completion had no text in it.
    #[error("Completion service returned an empty response")]
    EmptyResponse,

    #[error("Completion timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Error: {message}")]
    Other { message: String },
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

impl From<LlmError> for AskDbError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout { secs } => AskDbError::Timeout {
                operation: "completion".to_string(),
                secs,
            },
            other => AskDbError::Generation(other.to_string()),
        }
    }
}

/// Error for a client that has no API key to send.
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Map a non-success HTTP status to an [`LlmError`].
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status,
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_error() {
        match missing_api_key_error("openai") {
            LlmError::AuthenticationFailed { message } => assert!(message.contains("openai")),
            other => panic!("Expected AuthenticationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_http_error() {
        assert!(matches!(
            parse_http_error(401, "unauthorized", "openai"),
            LlmError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            parse_http_error(403, "forbidden", "openai"),
            LlmError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            parse_http_error(404, "gpt-9", "openai"),
            LlmError::ModelNotFound { .. }
        ));
        assert!(matches!(
            parse_http_error(429, "slow down", "openai"),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            parse_http_error(400, "bad", "openai"),
            LlmError::InvalidRequest { .. }
        ));
        assert_eq!(
            parse_http_error(503, "overloaded", "openai"),
            LlmError::ServerError {
                message: "overloaded".to_string(),
                status: 503
            }
        );
        assert!(matches!(
            parse_http_error(302, "moved", "openai"),
            LlmError::Other { .. }
        ));
    }

    #[test]
    fn test_conversion_into_askdb_error() {
        let err: AskDbError = LlmError::EmptyResponse.into();
        assert!(matches!(err, AskDbError::Generation(_)));

        let err: AskDbError = LlmError::Timeout { secs: 60 }.into();
        assert_eq!(err.to_string(), "completion timed out after 60s");

        let err: AskDbError = parse_http_error(500, "boom", "openai").into();
        assert_eq!(err.to_string(), "Generation error: Server error (500): boom");
    }
}
