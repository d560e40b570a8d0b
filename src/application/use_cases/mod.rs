pub mod ai_agent;
pub mod clean_pipeline;
pub mod rule_cleaner;
