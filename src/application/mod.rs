pub mod use_cases;

pub use use_cases::ai_agent::{CleaningAgent, LlmCleaningAgent, PassthroughAgent};
pub use use_cases::clean_pipeline::CleanPipeline;
pub use use_cases::rule_cleaner::{RuleBasedCleaner, TableTransformer};
