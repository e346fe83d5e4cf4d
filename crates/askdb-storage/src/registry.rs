//! Process-wide database configuration.
//!
//! The registry holds one [`DatabaseSnapshot`] at a time. A snapshot pairs a
//! connection with the schema reflected from it, so readers always see a
//! matching pair. Reconfiguration builds the new snapshot completely before
//! swapping it in; a failure leaves the current snapshot untouched.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use askdb_core::error::{AskDbError, Result};
use askdb_core::types::SchemaDescriptor;

use crate::connection::DatabaseTarget;
use crate::db::Database;
use crate::reflector::SchemaReflector;

/// An immutable, consistent connection + schema pair.
#[derive(Debug)]
pub struct DatabaseSnapshot {
    /// Increases by one on every successful reconfiguration.
    pub version: u64,
    pub target: String,
    pub database: Arc<Database>,
    pub schema: Arc<SchemaDescriptor>,
    pub configured_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct DatabaseRegistry {
    current: RwLock<Option<Arc<DatabaseSnapshot>>>,
}

impl DatabaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot in effect right now, if any.
    pub fn snapshot(&self) -> Option<Arc<DatabaseSnapshot>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Install an already opened database and its schema.
    pub fn publish(&self, database: Database, schema: SchemaDescriptor) -> Arc<DatabaseSnapshot> {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let version = guard.as_ref().map(|s| s.version).unwrap_or(0) + 1;
        let snapshot = Arc::new(DatabaseSnapshot {
            version,
            target: database.label().to_string(),
            database: Arc::new(database),
            schema: Arc::new(schema),
            configured_at: Utc::now(),
        });
        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Parse, open, and reflect `connection_string`, then swap it in.
    ///
    /// All-or-nothing: on any error the previous snapshot stays current.
    pub async fn configure(&self, connection_string: &str) -> Result<Arc<DatabaseSnapshot>> {
        let raw = connection_string.to_string();
        let built = tokio::task::spawn_blocking(move || {
            let target = DatabaseTarget::parse(&raw)?;
            let database = Database::open(&target)?;
            let schema = SchemaReflector::new().reflect(&database)?;
            Ok::<_, AskDbError>((database, schema))
        })
        .await
        .map_err(|e| AskDbError::Configuration(format!("configuration task failed: {}", e)))?;

        let (database, schema) = match built {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Reconfiguration failed, keeping previous database");
                return Err(e);
            }
        };

        let snapshot = self.publish(database, schema);
        info!(
            version = snapshot.version,
            target = %snapshot.target,
            tables = snapshot.schema.tables.len(),
            "Database configured"
        );
        Ok(snapshot)
    }
}
