//! Remote API fetcher for the clean-api endpoint.
//!
//! Issues an HTTP GET against the caller's URL and decodes the JSON response
//! body (an array of objects) into a Table. A non-success upstream status is
//! a distinct error so the router can report it as a client error.

use crate::domain::error::{AppError, Result};
use crate::domain::table::{Record, Table};
use serde_json::Value;
use tracing::info;

pub struct RemoteApiFetcher {
    client: reqwest::Client,
}

impl RemoteApiFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub async fn fetch_table(&self, api_url: &str) -> Result<Table> {
        let parsed = url::Url::parse(api_url)
            .map_err(|e| AppError::Validation(format!("Invalid API URL '{}': {}", api_url, e)))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| AppError::DataSource(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus(format!("status {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Decode(format!("Response body is not valid JSON: {}", e)))?;

        let table = json_to_table(&body)?;
        info!(rows = table.row_count(), url = %api_url, "Fetched remote table");
        Ok(table)
    }
}

impl Default for RemoteApiFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a JSON array of objects. Column order is first-seen key order
/// across all objects; keys missing from a row become null.
pub(crate) fn json_to_table(body: &Value) -> Result<Table> {
    let items = body
        .as_array()
        .ok_or_else(|| AppError::Decode("Expected a JSON array of objects".to_string()))?;

    let mut objects = Vec::with_capacity(items.len());
    for item in items {
        let object = item.as_object().ok_or_else(|| {
            AppError::Decode("Expected every array element to be an object".to_string())
        })?;
        objects.push(object);
    }

    let mut columns: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut records: Vec<Record> = Vec::with_capacity(objects.len());
    for object in objects {
        let mut record = Record::new();
        for column in &columns {
            record.insert(
                column.clone(),
                object.get(column).cloned().unwrap_or(Value::Null),
            );
        }
        records.push(record);
    }

    Ok(Table::with_rows(columns, records))
}
