use thiserror::Error;

/// Top-level error type for askdb.
///
/// The first group of variants is the pipeline taxonomy: which ones abort a
/// single exchange, which abort only a control operation, and which close a
/// session is decided by the caller from the variant. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for AskDbError`
/// so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AskDbError {
    /// Bad or unreachable database target.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Catalog introspection failed on an otherwise working connection.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The completion service failed or returned unusable content.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The safety gate rejected the candidate query.
    #[error("Unsafe query blocked: {reason}")]
    UnsafeQuery { reason: String },

    /// The database rejected or failed the query.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The bidirectional session channel failed.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Settings file could not be parsed or written.
    #[error("Settings error: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AskDbError {
    /// Whether this error must terminate the session it occurred in.
    ///
    /// Only transport failures do; everything else is confined to the
    /// exchange or control operation that raised it.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self, AskDbError::Transport(_))
    }
}

impl From<toml::de::Error> for AskDbError {
    fn from(err: toml::de::Error) -> Self {
        AskDbError::Settings(err.to_string())
    }
}

impl From<toml::ser::Error> for AskDbError {
    fn from(err: toml::ser::Error) -> Self {
        AskDbError::Settings(err.to_string())
    }
}

/// A specialized `Result` type for askdb operations.
pub type Result<T> = std::result::Result<T, AskDbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(AskDbError, &str)> = vec![
            (
                AskDbError::Configuration("connection refused".to_string()),
                "Configuration error: connection refused",
            ),
            (
                AskDbError::Schema("no such table: sqlite_master".to_string()),
                "Schema error: no such table: sqlite_master",
            ),
            (
                AskDbError::Generation("empty completion".to_string()),
                "Generation error: empty completion",
            ),
            (
                AskDbError::UnsafeQuery {
                    reason: "blocked keyword 'drop'".to_string(),
                },
                "Unsafe query blocked: blocked keyword 'drop'",
            ),
            (
                AskDbError::Execution("no such column: foo".to_string()),
                "Execution error: no such column: foo",
            ),
            (
                AskDbError::Transport("socket reset".to_string()),
                "Transport error: socket reset",
            ),
            (
                AskDbError::Timeout {
                    operation: "query execution".to_string(),
                    secs: 30,
                },
                "query execution timed out after 30s",
            ),
            (
                AskDbError::Settings("bad key".to_string()),
                "Settings error: bad key",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_only_transport_is_fatal() {
        assert!(AskDbError::Transport("closed".into()).is_fatal_to_session());
        assert!(!AskDbError::Generation("x".into()).is_fatal_to_session());
        assert!(!AskDbError::Execution("x".into()).is_fatal_to_session());
        assert!(!AskDbError::UnsafeQuery { reason: "x".into() }.is_fatal_to_session());
        assert!(!AskDbError::Timeout {
            operation: "x".into(),
            secs: 1
        }
        .is_fatal_to_session());
        assert!(!AskDbError::Configuration("x".into()).is_fatal_to_session());
        assert!(!AskDbError::Schema("x".into()).is_fatal_to_session());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AskDbError = io_err.into();
        assert!(matches!(err, AskDbError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let converted: AskDbError = err.unwrap_err().into();
        assert!(matches!(converted, AskDbError::Settings(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
