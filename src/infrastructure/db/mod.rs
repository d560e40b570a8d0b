//! Database query executor for the clean-db endpoint.
//!
//! Connects to an external database (PostgreSQL/SQLite, chosen by the
//! connection string scheme), runs the caller's query and materializes every
//! result row into a Table. Connections are scoped to a single request: the
//! pool is created, used once and closed before returning.

use crate::domain::error::{AppError, Result};
use crate::domain::table::{Record, Table};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row};
use std::time::Duration;
use tracing::info;

/// Timeouts and pool sizing for request-scoped query execution.
#[derive(Debug, Clone)]
pub struct DbQueryConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

impl Default for DbQueryConfig {
    fn default() -> Self {
        Self {
            max_connections: 1,
            connect_timeout_secs: 10,
            query_timeout_secs: 30,
        }
    }
}

pub struct DbQueryExecutor {
    config: DbQueryConfig,
}

impl DbQueryExecutor {
    pub fn new() -> Self {
        Self {
            config: DbQueryConfig::default(),
        }
    }

    pub fn with_config(config: DbQueryConfig) -> Self {
        Self { config }
    }

    /// Execute `query` against the database at `db_url` and materialize all
    /// rows. The driver is picked from the URL scheme.
    pub async fn fetch_table(&self, db_url: &str, query: &str) -> Result<Table> {
        if db_url.starts_with("postgres://") || db_url.starts_with("postgresql://") {
            self.fetch_postgres(db_url, query).await
        } else if db_url.starts_with("sqlite:") {
            self.fetch_sqlite(db_url, query).await
        } else {
            let scheme = db_url.split(':').next().unwrap_or("");
            Err(AppError::DataSource(format!(
                "Unsupported database URL scheme: '{}'",
                scheme
            )))
        }
    }

    async fn fetch_postgres(&self, db_url: &str, query: &str) -> Result<Table> {
        let pool = tokio::time::timeout(
            Duration::from_secs(self.config.connect_timeout_secs),
            PgPoolOptions::new()
                .max_connections(self.config.max_connections)
                .connect(db_url),
        )
        .await
        .map_err(|_| {
            AppError::DataSource(format!(
                "Connection timed out after {} seconds",
                self.config.connect_timeout_secs
            ))
        })?
        .map_err(|e| AppError::DataSource(format!("Failed to connect to PostgreSQL: {}", e)))?;

        let result = tokio::time::timeout(
            Duration::from_secs(self.config.query_timeout_secs),
            sqlx::query(query).fetch_all(&pool),
        )
        .await;

        let rows = match result {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                pool.close().await;
                return Err(AppError::DataSource(format!(
                    "Query execution failed: {}",
                    e
                )));
            }
            Err(_) => {
                pool.close().await;
                return Err(AppError::DataSource(format!(
                    "Query timed out after {} seconds",
                    self.config.query_timeout_secs
                )));
            }
        };

        let table = pg_rows_to_table(&rows);
        pool.close().await;

        info!(rows = table.row_count(), "Materialized PostgreSQL result");
        Ok(table)
    }

    async fn fetch_sqlite(&self, db_url: &str, query: &str) -> Result<Table> {
        let pool = tokio::time::timeout(
            Duration::from_secs(self.config.connect_timeout_secs),
            SqlitePoolOptions::new()
                .max_connections(self.config.max_connections)
                .connect(db_url),
        )
        .await
        .map_err(|_| {
            AppError::DataSource(format!(
                "Connection timed out after {} seconds",
                self.config.connect_timeout_secs
            ))
        })?
        .map_err(|e| AppError::DataSource(format!("Failed to connect to SQLite: {}", e)))?;

        let result = tokio::time::timeout(
            Duration::from_secs(self.config.query_timeout_secs),
            sqlx::query(query).fetch_all(&pool),
        )
        .await;

        let rows = match result {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                pool.close().await;
                return Err(AppError::DataSource(format!(
                    "Query execution failed: {}",
                    e
                )));
            }
            Err(_) => {
                pool.close().await;
                return Err(AppError::DataSource(format!(
                    "Query timed out after {} seconds",
                    self.config.query_timeout_secs
                )));
            }
        };

        let table = sqlite_rows_to_table(&rows);
        pool.close().await;

        info!(rows = table.row_count(), "Materialized SQLite result");
        Ok(table)
    }
}

impl Default for DbQueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn pg_rows_to_table(rows: &[PgRow]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    let mut records: Vec<Record> = Vec::new();

    for row in rows {
        if columns.is_empty() {
            columns = row.columns().iter().map(|c| c.name().to_string()).collect();
        }

        let mut record = Record::new();
        for (index, column) in row.columns().iter().enumerate() {
            record.insert(column.name().to_string(), extract_pg_value(row, index));
        }
        records.push(record);
    }

    Table::with_rows(columns, records)
}

/// Extract a column value from a PostgreSQL row as JSON, trying types in
/// order of likelihood.
fn extract_pg_value(row: &PgRow, index: usize) -> serde_json::Value {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v
            .map(|n| serde_json::Value::Number(n.into()))
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v
            .map(|n| serde_json::Value::Number(n.into()))
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v
            .map(serde_json::Value::Bool)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index) {
        return v
            .map(|dt| serde_json::Value::String(dt.to_rfc3339()))
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(index) {
        return v
            .map(|d| serde_json::Value::String(d.to_string()))
            .unwrap_or(serde_json::Value::Null);
    }

    serde_json::Value::Null
}

fn sqlite_rows_to_table(rows: &[SqliteRow]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    let mut records: Vec<Record> = Vec::new();

    for row in rows {
        if columns.is_empty() {
            columns = row.columns().iter().map(|c| c.name().to_string()).collect();
        }

        let mut record = Record::new();
        for (index, column) in row.columns().iter().enumerate() {
            record.insert(column.name().to_string(), extract_sqlite_value(row, index));
        }
        records.push(record);
    }

    Table::with_rows(columns, records)
}

fn extract_sqlite_value(row: &SqliteRow, index: usize) -> serde_json::Value {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v
            .map(|n| serde_json::Value::Number(n.into()))
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v
            .map(serde_json::Value::Bool)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
        return v
            .map(|dt| serde_json::Value::String(dt.to_string()))
            .unwrap_or(serde_json::Value::Null);
    }

    serde_json::Value::Null
}
