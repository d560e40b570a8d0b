use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A single materialized row, keyed by column name.
pub type Record = HashMap<String, Value>;

/// An ordered, in-memory table. Column order is meaningful (it drives CSV
/// rendering and the response layout); rows carry JSON values typed per
/// column by the decoder that produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Consume the table into its rows, in original order.
    pub fn into_records(self) -> Vec<Record> {
        self.rows
    }
}

/// Result of the AI cleaning stage. The agent may hand back a table
/// directly or a CSV-encoded rendition of one; the pipeline normalizes
/// the latter before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    Table(Table),
    RawText(String),
}

/// Upload formats accepted by the file endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Pick the format from the uploaded filename's extension.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = filename.rsplit('.').next().unwrap_or("");
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" => Ok(SourceFormat::Xlsx),
            other => Err(AppError::UnsupportedFormat(format!(
                "'{}' (use CSV or Excel)",
                other
            ))),
        }
    }
}
