//! AI cleaning stage.
//!
//! Second pass over the table. The default implementation hands the table to
//! an OpenAI-compatible model as CSV and returns the model's CSV reply; the
//! pipeline re-parses it. The agent is a black box: no per-cell audit trail
//! is kept.

use crate::domain::error::{AppError, Result};
use crate::domain::table::{AgentOutput, Table};
use crate::infrastructure::config::AgentConfig;
use crate::infrastructure::decode::csv::table_to_csv;
use crate::infrastructure::llm_clients::LLMClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

const SYSTEM_PROMPT: &str = "You are a data cleaning assistant. You receive a table encoded as CSV \
with a header row. Fix obvious data quality issues (inconsistent casing, malformed values, \
impossible entries) without inventing new rows or columns. Reply with the cleaned table as CSV \
only, keeping the header row. Do not add commentary or code fences.";

#[async_trait]
pub trait CleaningAgent: Send + Sync {
    async fn process(&self, table: &Table) -> Result<AgentOutput>;
}

pub struct LlmCleaningAgent {
    client: Arc<dyn LLMClient>,
    config: AgentConfig,
}

impl LlmCleaningAgent {
    pub fn new(client: Arc<dyn LLMClient>, config: AgentConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl CleaningAgent for LlmCleaningAgent {
    async fn process(&self, table: &Table) -> Result<AgentOutput> {
        let csv_text = table_to_csv(table)?;

        info!(
            rows = table.row_count(),
            model = %self.config.model,
            "Sending table to cleaning model"
        );

        let reply = self
            .client
            .generate(&self.config, SYSTEM_PROMPT, &csv_text)
            .await?;

        if reply.trim().is_empty() {
            return Err(AppError::Agent("Model returned an empty reply".to_string()));
        }

        Ok(AgentOutput::RawText(strip_code_fences(&reply)))
    }
}

/// Identity agent used when no model is configured.
pub struct PassthroughAgent;

#[async_trait]
impl CleaningAgent for PassthroughAgent {
    async fn process(&self, table: &Table) -> Result<AgentOutput> {
        Ok(AgentOutput::Table(table.clone()))
    }
}

/// Models often wrap tabular replies in Markdown fences despite the prompt.
fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if lines.last().map(|l| l.trim() == "```").unwrap_or(false) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}
