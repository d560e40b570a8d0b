// ============================================================
// CSV DECODER
// ============================================================
// Parse CSV payloads with a header row and per-column type inference.

use crate::domain::error::{AppError, Result};
use crate::domain::table::{Record, Table};
use csv::ReaderBuilder;
use serde_json::Value;

/// Decode CSV bytes. The payload must be valid UTF-8 with a header row.
pub fn decode_bytes(bytes: &[u8]) -> Result<Table> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| AppError::Decode(format!("File is not valid UTF-8: {}", e)))?;
    decode_str(content)
}

/// Decode CSV text. Column types are inferred per column: a column whose
/// non-empty cells all parse as integers becomes an integer column, then
/// floats, then booleans, otherwise strings. Empty cells become null.
pub fn decode_str(content: &str) -> Result<Table> {
    let mut reader = ReaderBuilder::new().from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::Decode(format!("Failed to read CSV headers: {}", e)))?
        .clone();
    let columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| AppError::Decode(format!("Failed to parse CSV row {}: {}", index + 1, e)))?;
        raw_rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(build_table(columns, raw_rows))
}

/// Render a table back to CSV text, header first, rows in original order.
/// Null cells become empty fields.
pub fn table_to_csv(table: &Table) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(&table.columns)
        .map_err(|e| AppError::Decode(format!("Failed to encode CSV header: {}", e)))?;

    for row in &table.rows {
        let record: Vec<String> = table
            .columns
            .iter()
            .map(|column| cell_to_field(row.get(column)))
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| AppError::Decode(format!("Failed to encode CSV row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Decode(format!("Failed to flush CSV output: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Decode(format!("CSV output is not UTF-8: {}", e)))
}

fn cell_to_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Int,
    Float,
    Bool,
    Text,
}

fn build_table(columns: Vec<String>, raw_rows: Vec<Vec<String>>) -> Table {
    let types: Vec<ColumnType> = (0..columns.len())
        .map(|index| {
            infer_column_type(
                raw_rows
                    .iter()
                    .map(|row| row.get(index).map(String::as_str).unwrap_or("")),
            )
        })
        .collect();

    let mut rows: Vec<Record> = Vec::with_capacity(raw_rows.len());
    for raw in &raw_rows {
        let mut record = Record::new();
        for (index, column) in columns.iter().enumerate() {
            let field = raw.get(index).map(String::as_str).unwrap_or("");
            record.insert(column.clone(), coerce(field, types[index]));
        }
        rows.push(record);
    }

    Table::with_rows(columns, rows)
}

fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: Iterator<Item = &'a str>,
{
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    let mut seen = false;

    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        seen = true;
        all_int = all_int && value.parse::<i64>().is_ok();
        all_float = all_float && value.parse::<f64>().is_ok();
        all_bool = all_bool && matches!(value.to_ascii_lowercase().as_str(), "true" | "false");
    }

    if !seen {
        return ColumnType::Text;
    }
    if all_int {
        ColumnType::Int
    } else if all_float {
        ColumnType::Float
    } else if all_bool {
        ColumnType::Bool
    } else {
        ColumnType::Text
    }
}

fn coerce(field: &str, column_type: ColumnType) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match column_type {
        ColumnType::Int => trimmed
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::Null),
        ColumnType::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnType::Bool => Value::Bool(trimmed.eq_ignore_ascii_case("true")),
        ColumnType::Text => Value::String(field.to_string()),
    }
}
