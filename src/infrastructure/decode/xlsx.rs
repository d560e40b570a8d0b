// ============================================================
// XLSX DECODER
// ============================================================
// Parse spreadsheet workbooks; the first sheet's header row names columns.

use crate::domain::error::{AppError, Result};
use crate::domain::table::{Record, Table};
use calamine::{Data, DataType, Reader, Xlsx};
use serde_json::Value;
use std::io::Cursor;

/// Decode XLSX bytes from the first worksheet.
pub fn decode_bytes(bytes: &[u8]) -> Result<Table> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::Decode(format!("Failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Decode("No worksheet found in workbook".to_string()))?
        .map_err(|e| AppError::Decode(format!("Failed to read worksheet: {}", e)))?;

    rows_to_table(range.rows())
}

/// Build a table from sheet rows. The first row is the header; cell types
/// carry over (whole floats narrow to integers, as spreadsheets store all
/// numbers as floats).
pub(crate) fn rows_to_table<'a, I>(mut rows: I) -> Result<Table>
where
    I: Iterator<Item = &'a [Data]>,
{
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(Table::default()),
    };
    let columns: Vec<String> = header.iter().map(cell_text).collect();

    let mut records: Vec<Record> = Vec::new();
    for row in rows {
        let mut record = Record::new();
        for (index, column) in columns.iter().enumerate() {
            let value = row.get(index).map(cell_value).unwrap_or(Value::Null);
            record.insert(column.clone(), value);
        }
        records.push(record);
    }

    Ok(Table::with_rows(columns, records))
}

fn cell_text(cell: &Data) -> String {
    cell.as_string()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{}", cell))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Value::Number((*f as i64).into())
            } else {
                serde_json::Number::from_f64(*f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(cell_text(other)),
    }
}
