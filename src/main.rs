use std::sync::Arc;

use tablewash::application::use_cases::ai_agent::{
    CleaningAgent, LlmCleaningAgent, PassthroughAgent,
};
use tablewash::application::use_cases::rule_cleaner::{RuleBasedCleaner, TableTransformer};
use tablewash::application::CleanPipeline;
use tablewash::infrastructure::config::ServiceConfig;
use tablewash::infrastructure::db::DbQueryExecutor;
use tablewash::infrastructure::llm_clients::{LLMClient, OpenAIClient};
use tablewash::infrastructure::remote::RemoteApiFetcher;
use tablewash::interfaces::http::{start_server, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .try_init();

    let config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    let cleaner: Arc<dyn TableTransformer> = Arc::new(RuleBasedCleaner::new());
    let agent: Arc<dyn CleaningAgent> = if config.agent.enabled {
        info!(model = %config.agent.model, "AI cleaning agent enabled");
        let client: Arc<dyn LLMClient> = Arc::new(OpenAIClient::new());
        Arc::new(LlmCleaningAgent::new(client, config.agent.clone()))
    } else {
        info!("AI cleaning agent disabled, using passthrough");
        Arc::new(PassthroughAgent)
    };

    let state = Arc::new(AppState {
        pipeline: CleanPipeline::new(cleaner, agent),
        db: DbQueryExecutor::new(),
        remote: RemoteApiFetcher::new(),
    });

    info!("Starting tablewash on {}:{}", config.host, config.port);
    start_server(&config, state)?.await
}
