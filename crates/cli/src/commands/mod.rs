//! Command handlers for the liftrag CLI.

pub mod ask;
pub mod chat;
pub mod extract;
pub mod ingest;
pub mod prompts;

use liftrag_core::{config::AppConfig, AppResult};
use liftrag_knowledge::RagOrchestrator;
use liftrag_llm::{create_clients, Clients};

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use extract::ExtractCommand;
pub use ingest::IngestCommand;
pub use prompts::PromptsCommand;

/// Bedrock clients for the configured region and key.
fn clients(config: &AppConfig) -> AppResult<Clients> {
    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        tracing::warn!(
            "No Bedrock API key found in {}, requests will be unauthenticated",
            config.bedrock.api_key_env
        );
    }
    create_clients(&config.bedrock, api_key.as_deref())
}

/// Validated pipeline for answering questions.
fn orchestrator(config: &AppConfig) -> AppResult<RagOrchestrator> {
    config.validate()?;
    RagOrchestrator::from_config(config, clients(config)?)
}
