//! Guarded query execution.
//!
//! Every candidate query passes the [`SafetyGate`] before it reaches the
//! database. Accepted queries run on the blocking pool under a deadline. When
//! the deadline passes only this execution is cancelled: a query still queued
//! on the connection lock is skipped, a running one is aborted.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Number, Value};
use tracing::{debug, info, warn};

use askdb_core::error::{AskDbError, Result};
use askdb_core::safety::{SafetyGate, SafetyVerdict};
use askdb_core::types::{QueryResult, QueryRow, MAX_RESULT_ROWS};

use crate::db::{CancelFlag, Database};

/// Runs gated, read-only queries and shapes their rows.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    gate: SafetyGate,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            gate: SafetyGate::new(),
            timeout,
        }
    }

    /// Run `sql` against `db`, returning at most [`MAX_RESULT_ROWS`] rows.
    ///
    /// An unsafe query never reaches the database.
    pub async fn execute(&self, db: Arc<Database>, sql: &str) -> Result<QueryResult> {
        if let SafetyVerdict::Unsafe { reason } = self.gate.check(sql) {
            warn!(reason = %reason, "Query rejected by safety gate");
            return Err(AskDbError::UnsafeQuery { reason });
        }

        let owned_sql = sql.trim().to_string();
        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();
        let worker_db = Arc::clone(&db);
        let task = tokio::task::spawn_blocking(move || {
            worker_db.with_cancellable_conn(&worker_cancel, |conn| {
                read_rows(conn, &owned_sql, MAX_RESULT_ROWS)
            })
        });

        let rows = match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined
                .map_err(|e| AskDbError::Execution(format!("query task failed: {}", e)))??,
            Err(_) => {
                cancel.cancel();
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    database = db.label(),
                    "Query timed out, execution cancelled"
                );
                return Err(AskDbError::Timeout {
                    operation: "query execution".to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        info!(rows = rows.len(), database = db.label(), "Query executed");
        Ok(QueryResult::from_rows(rows))
    }
}

/// How integer values in a column should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temporal {
    Date,
    DateTime,
}

fn temporal_kind(decl_type: Option<&str>) -> Option<Temporal> {
    let decl = decl_type?.to_ascii_uppercase();
    if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
        Some(Temporal::DateTime)
    } else if decl == "DATE" {
        Some(Temporal::Date)
    } else {
        None
    }
}

/// Step through the statement, stopping once `limit` rows are collected.
fn read_rows(conn: &Connection, sql: &str, limit: usize) -> Result<Vec<QueryRow>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| AskDbError::Execution(e.to_string()))?;

    let columns: Vec<(String, Option<Temporal>)> = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), temporal_kind(c.decl_type())))
        .collect();

    let mut rows = stmt
        .query([])
        .map_err(|e| AskDbError::Execution(e.to_string()))?;

    let mut out = Vec::new();
    while out.len() < limit {
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => return Err(AskDbError::Execution(e.to_string())),
        };

        let mut record = QueryRow::new();
        for (idx, (name, temporal)) in columns.iter().enumerate() {
            let value = row
                .get_ref(idx)
                .map_err(|e| AskDbError::Execution(e.to_string()))?;
            // Duplicate column names collapse; the last one wins.
            record.insert(name.clone(), render_value(value, *temporal));
        }
        out.push(record);
    }

    debug!(columns = columns.len(), rows = out.len(), "Rows collected");
    Ok(out)
}

fn render_value(value: ValueRef<'_>, temporal: Option<Temporal>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => match temporal.and_then(|t| render_timestamp(i, t)) {
            Some(text) => Value::String(text),
            None => Value::from(i),
        },
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}

/// Integer date columns hold Unix seconds.
fn render_timestamp(secs: i64, temporal: Temporal) -> Option<String> {
    let dt: DateTime<Utc> = DateTime::from_timestamp(secs, 0)?;
    Some(match temporal {
        Temporal::Date => dt.format("%Y-%m-%d").to_string(),
        Temporal::DateTime => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}
