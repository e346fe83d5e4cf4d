//! Shared domain types: schema descriptors and query results.

use serde::{Deserialize, Serialize};

/// Maximum number of rows kept from any query result.
pub const MAX_RESULT_ROWS: usize = 10;

/// One column of a reflected table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type as reported by the catalog (`ANY` when undeclared).
    pub data_type: String,
}

/// One reflected table with its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

/// Ordered description of every table visible to a connection.
///
/// Built once per successful reconfiguration and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub tables: Vec<TableSchema>,
}

impl SchemaDescriptor {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Render the schema as prompt text, one line per table:
    /// `Table: users -> id (INTEGER), name (TEXT)`.
    pub fn render(&self) -> String {
        self.tables
            .iter()
            .map(|table| {
                let columns = table
                    .columns
                    .iter()
                    .map(|c| format!("{} ({})", c.name, c.data_type))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Table: {} -> {}", table.name, columns)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single result row: column name to JSON value, in column order.
pub type QueryRow = serde_json::Map<String, serde_json::Value>;

/// At most [`MAX_RESULT_ROWS`] rows in the order the database returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResult {
    pub rows: Vec<QueryRow>,
}

impl QueryResult {
    /// Keep only the first [`MAX_RESULT_ROWS`] rows. Truncation is silent.
    pub fn from_rows(mut rows: Vec<QueryRow>) -> Self {
        rows.truncate(MAX_RESULT_ROWS);
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One compact JSON object per line, for prompt embedding.
    pub fn render_lines(&self) -> String {
        self.rows
            .iter()
            .map(|row| serde_json::Value::Object(row.clone()).to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users_schema() -> SchemaDescriptor {
        SchemaDescriptor::new(vec![
            TableSchema {
                name: "orders".to_string(),
                columns: vec![
                    ColumnSchema {
                        name: "id".to_string(),
                        data_type: "INTEGER".to_string(),
                    },
                    ColumnSchema {
                        name: "total".to_string(),
                        data_type: "REAL".to_string(),
                    },
                ],
            },
            TableSchema {
                name: "users".to_string(),
                columns: vec![
                    ColumnSchema {
                        name: "id".to_string(),
                        data_type: "INTEGER".to_string(),
                    },
                    ColumnSchema {
                        name: "updated_at".to_string(),
                        data_type: "DATETIME".to_string(),
                    },
                ],
            },
        ])
    }

    fn row(n: i64) -> QueryRow {
        let mut r = QueryRow::new();
        r.insert("n".to_string(), json!(n));
        r
    }

    #[test]
    fn test_render_schema_lines() {
        let text = users_schema().render();
        assert_eq!(
            text,
            "Table: orders -> id (INTEGER), total (REAL)\nTable: users -> id (INTEGER), updated_at (DATETIME)"
        );
    }

    #[test]
    fn test_render_empty_schema() {
        assert_eq!(SchemaDescriptor::default().render(), "");
        assert!(SchemaDescriptor::default().is_empty());
    }

    #[test]
    fn test_table_names_in_order() {
        assert_eq!(users_schema().table_names(), vec!["orders", "users"]);
    }

    #[test]
    fn test_from_rows_truncates_to_first_ten_in_order() {
        let result = QueryResult::from_rows((0..15).map(row).collect());
        assert_eq!(result.len(), MAX_RESULT_ROWS);
        for (i, r) in result.rows.iter().enumerate() {
            assert_eq!(r["n"], json!(i as i64));
        }
    }

    #[test]
    fn test_from_rows_keeps_short_results() {
        assert_eq!(QueryResult::from_rows((0..3).map(row).collect()).len(), 3);
        assert_eq!(QueryResult::from_rows((0..10).map(row).collect()).len(), 10);
        assert!(QueryResult::from_rows(vec![]).is_empty());
    }

    #[test]
    fn test_query_result_serializes_as_array() {
        let result = QueryResult::from_rows(vec![row(1), row(2)]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!([{"n": 1}, {"n": 2}]));
    }

    #[test]
    fn test_render_lines_one_row_per_line() {
        let mut r = QueryRow::new();
        r.insert("name".to_string(), json!("Ada"));
        r.insert("age".to_string(), json!(36));
        let result = QueryResult::from_rows(vec![r, row(7)]);
        assert_eq!(result.render_lines(), "{\"name\":\"Ada\",\"age\":36}\n{\"n\":7}");
    }
}
