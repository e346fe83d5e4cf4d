//! Read-only database handle.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Connections are opened read-only with `query_only` set. Cancellation is
//! scoped to one caller through a [`CancelFlag`], so cancelling one query
//! never touches another statement sharing the connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use askdb_core::error::{AskDbError, Result};

use crate::connection::DatabaseTarget;

/// How long SQLite waits on a locked database file before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Virtual machine steps between cancellation checks.
const CANCEL_CHECK_OPS: i32 = 1000;

/// Cancellation signal owned by a single query execution.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Thread-safe read-only SQLite handle.
pub struct Database {
    conn: Mutex<Connection>,
    label: String,
}

impl Database {
    /// Open `target` read-only and run a connection test.
    ///
    /// Any failure here is a configuration problem: the file is missing,
    /// unreadable, or not something SQLite can open.
    pub fn open(target: &DatabaseTarget) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = match target {
            DatabaseTarget::File(path) => Connection::open_with_flags(path, flags),
            DatabaseTarget::Uri(uri) => Connection::open_with_flags(uri, flags),
        }
        .map_err(|e| {
            AskDbError::Configuration(format!("failed to open {}: {}", target, e))
        })?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| AskDbError::Configuration(format!("failed to set busy timeout: {}", e)))?;

        let db = Self::from_connection(conn, target.to_string())?;
        info!(target = %target, "Database opened read-only");
        Ok(db)
    }

    /// Wrap an existing connection, switching it to `query_only` mode.
    ///
    /// Used for fixtures that populate a connection before handing it over.
    pub fn from_connection(conn: Connection, label: impl Into<String>) -> Result<Self> {
        conn.execute_batch("PRAGMA query_only = ON;")
            .map_err(|e| AskDbError::Configuration(format!("failed to set pragmas: {}", e)))?;

        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| AskDbError::Configuration(format!("connection test failed: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            label: label.into(),
        })
    }

    /// Human-readable name of the target this handle was opened from.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AskDbError::Execution(format!("database lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Like [`Database::with_conn`], but abandoned once `cancel` is set.
    ///
    /// A flag set while the caller is still queued on the lock skips the
    /// closure entirely. A flag set while the closure runs aborts its
    /// statement at the next progress check with an `interrupted` error.
    pub fn with_cancellable_conn<F, T>(&self, cancel: &CancelFlag, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.with_conn(|conn| {
            if cancel.is_cancelled() {
                return Err(AskDbError::Execution(
                    "query cancelled before it started".to_string(),
                ));
            }

            let flag = cancel.clone();
            conn.progress_handler(CANCEL_CHECK_OPS, Some(move || flag.is_cancelled()));
            let result = f(conn);
            conn.progress_handler(0, None::<fn() -> bool>);
            result
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("label", &self.label).finish()
    }
}
