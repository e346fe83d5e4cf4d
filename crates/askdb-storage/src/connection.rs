//! Connection-string parsing.
//!
//! Accepted forms: `sqlite:///abs/path.db`, `sqlite://rel/path.db`,
//! `sqlite:path.db`, `file:path.db?mode=ro` (passed to SQLite as a URI) and a
//! bare filesystem path. Any other `scheme://` is rejected.

use std::fmt;
use std::path::PathBuf;

use askdb_core::error::{AskDbError, Result};

/// A parsed database target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// A database file on disk.
    File(PathBuf),
    /// A SQLite `file:` URI, opened with URI handling enabled.
    Uri(String),
}

impl DatabaseTarget {
    pub fn parse(connection_string: &str) -> Result<Self> {
        let raw = connection_string.trim();
        if raw.is_empty() {
            return Err(AskDbError::Configuration(
                "connection string is empty".to_string(),
            ));
        }

        if raw.starts_with("file:") {
            return Ok(DatabaseTarget::Uri(raw.to_string()));
        }

        let path = if let Some(rest) = raw.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = raw.strip_prefix("sqlite:") {
            rest
        } else if let Some((scheme, _)) = raw.split_once("://") {
            return Err(AskDbError::Configuration(format!(
                "unsupported database scheme '{}', expected sqlite",
                scheme
            )));
        } else {
            raw
        };

        if path.is_empty() {
            return Err(AskDbError::Configuration(format!(
                "connection string '{}' has no database path",
                raw
            )));
        }
        if path == ":memory:" {
            return Err(AskDbError::Configuration(
                "in-memory databases cannot be queried read-only".to_string(),
            ));
        }

        Ok(DatabaseTarget::File(PathBuf::from(path)))
    }
}

impl fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseTarget::File(path) => write!(f, "sqlite://{}", path.display()),
            DatabaseTarget::Uri(uri) => f.write_str(uri),
        }
    }
}
