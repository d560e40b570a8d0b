//! Rule-based cleaning stage.
//!
//! The first pass over a decoded table. Deterministic hygiene only: trim
//! string cells, drop rows with no content, drop exact duplicates. Column
//! names and order are never touched here.

use crate::domain::error::Result;
use crate::domain::table::{Record, Table};
use serde_json::Value;
use std::collections::HashSet;

/// A deterministic table transform. Implementations must not depend on
/// request state; the router shares one instance across requests.
pub trait TableTransformer: Send + Sync {
    fn transform(&self, table: Table) -> Result<Table>;
}

#[derive(Debug, Default)]
pub struct RuleBasedCleaner;

impl RuleBasedCleaner {
    pub fn new() -> Self {
        Self
    }
}

impl TableTransformer for RuleBasedCleaner {
    fn transform(&self, table: Table) -> Result<Table> {
        let columns = table.columns;
        let mut seen: HashSet<String> = HashSet::new();
        let mut rows: Vec<Record> = Vec::with_capacity(table.rows.len());

        for row in table.rows {
            let trimmed = trim_row(row);

            if is_empty_row(&trimmed, &columns) {
                continue;
            }

            let key = row_key(&trimmed, &columns);
            if !seen.insert(key) {
                continue;
            }

            rows.push(trimmed);
        }

        Ok(Table::with_rows(columns, rows))
    }
}

fn trim_row(row: Record) -> Record {
    row.into_iter()
        .map(|(column, value)| {
            let value = match value {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other,
            };
            (column, value)
        })
        .collect()
}

fn is_empty_row(row: &Record, columns: &[String]) -> bool {
    columns.iter().all(|column| match row.get(column) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    })
}

// Canonical key in column order, so duplicate detection is independent of
// map iteration order.
fn row_key(row: &Record, columns: &[String]) -> String {
    let values: Vec<&Value> = columns
        .iter()
        .map(|column| row.get(column).unwrap_or(&Value::Null))
        .collect();
    serde_json::to_string(&values).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table_from(rows: Vec<Vec<(&str, Value)>>) -> Table {
        let columns: Vec<String> = rows
            .first()
            .map(|r| r.iter().map(|(c, _)| c.to_string()).collect())
            .unwrap_or_default();
        let records = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(c, v)| (c.to_string(), v))
                    .collect::<Record>()
            })
            .collect();
        Table::with_rows(columns, records)
    }

    #[test]
    fn test_trims_string_cells() {
        let table = table_from(vec![vec![("name", json!("  Alice  ")), ("age", json!(30))]]);
        let cleaned = RuleBasedCleaner::new().transform(table).unwrap();
        assert_eq!(cleaned.rows[0]["name"], json!("Alice"));
        assert_eq!(cleaned.rows[0]["age"], json!(30));
    }

    #[test]
    fn test_drops_empty_rows() {
        let table = table_from(vec![
            vec![("a", json!("x")), ("b", json!(1))],
            vec![("a", json!("   ")), ("b", Value::Null)],
        ]);
        let cleaned = RuleBasedCleaner::new().transform(table).unwrap();
        assert_eq!(cleaned.row_count(), 1);
    }

    #[test]
    fn test_drops_exact_duplicates() {
        let table = table_from(vec![
            vec![("a", json!("x"))],
            vec![("a", json!("x"))],
            vec![("a", json!("y"))],
        ]);
        let cleaned = RuleBasedCleaner::new().transform(table).unwrap();
        assert_eq!(cleaned.row_count(), 2);
        assert_eq!(cleaned.rows[1]["a"], json!("y"));
    }

    #[test]
    fn test_preserves_columns_and_order() {
        let table = Table::with_rows(
            vec!["b".to_string(), "a".to_string()],
            vec![
                [("b".to_string(), json!(1)), ("a".to_string(), json!(2))]
                    .into_iter()
                    .collect(),
            ],
        );
        let cleaned = RuleBasedCleaner::new().transform(table).unwrap();
        assert_eq!(cleaned.columns, vec!["b", "a"]);
    }
}
