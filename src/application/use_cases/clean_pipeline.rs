//! The cleaning pipeline: rule-based cleaner, then AI agent, then
//! normalization of the agent's output back into a table.
//!
//! Collaborators are injected at startup; the pipeline holds no per-request
//! state and no retry policy — any stage failure aborts the request.

use crate::application::use_cases::ai_agent::CleaningAgent;
use crate::application::use_cases::rule_cleaner::TableTransformer;
use crate::domain::error::Result;
use crate::domain::table::{AgentOutput, Table};
use crate::infrastructure::decode::csv;
use std::sync::Arc;
use tracing::info;

pub struct CleanPipeline {
    cleaner: Arc<dyn TableTransformer>,
    agent: Arc<dyn CleaningAgent>,
}

impl CleanPipeline {
    pub fn new(cleaner: Arc<dyn TableTransformer>, agent: Arc<dyn CleaningAgent>) -> Self {
        Self { cleaner, agent }
    }

    pub async fn execute(&self, table: Table) -> Result<Table> {
        let input_rows = table.row_count();

        let cleaned = self.cleaner.transform(table)?;
        info!(
            before = input_rows,
            after = cleaned.row_count(),
            "Rule-based cleaning complete"
        );

        let output = self.agent.process(&cleaned).await?;
        let normalized = match output {
            AgentOutput::Table(table) => table,
            AgentOutput::RawText(text) => csv::decode_str(&text)?,
        };

        info!(rows = normalized.row_count(), "Cleaning pipeline complete");
        Ok(normalized)
    }
}
