//! Schema reflection.
//!
//! Enumerates the user tables of the `main` schema and their columns, in a
//! deterministic order, so that repeated reflection of an unchanged database
//! yields an identical descriptor.

use rusqlite::Connection;
use tracing::debug;

use askdb_core::error::{AskDbError, Result};
use askdb_core::types::{ColumnSchema, SchemaDescriptor, TableSchema};

use crate::db::Database;

/// Reads catalog metadata into a [`SchemaDescriptor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaReflector;

impl SchemaReflector {
    pub fn new() -> Self {
        Self
    }

    /// Reflect every user table visible to `db`.
    pub fn reflect(&self, db: &Database) -> Result<SchemaDescriptor> {
        let tables = db
            .with_conn(|conn| {
                let names = list_tables(conn)?;
                names
                    .into_iter()
                    .map(|name| {
                        let columns = list_columns(conn, &name)?;
                        Ok(TableSchema { name, columns })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .map_err(|e| match e {
                AskDbError::Schema(_) => e,
                other => AskDbError::Schema(other.to_string()),
            })?;

        debug!(tables = tables.len(), database = db.label(), "Schema reflected");
        Ok(SchemaDescriptor::new(tables))
    }
}

fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_'
             ORDER BY name",
        )
        .map_err(|e| AskDbError::Schema(format!("failed to list tables: {}", e)))?;

    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| AskDbError::Schema(format!("failed to list tables: {}", e)))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| AskDbError::Schema(format!("failed to read table name: {}", e)))
}

fn list_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnSchema>> {
    let sql = format!("PRAGMA table_info({})", single_quoted(table));
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AskDbError::Schema(format!("failed to inspect `{}`: {}", table, e)))?;

    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let declared: Option<String> = row.get(2)?;
            Ok(ColumnSchema {
                name,
                data_type: match declared {
                    Some(t) if !t.trim().is_empty() => t,
                    _ => "ANY".to_string(),
                },
            })
        })
        .map_err(|e| AskDbError::Schema(format!("failed to inspect `{}`: {}", table, e)))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| AskDbError::Schema(format!("failed to read column of `{}`: {}", table, e)))
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
