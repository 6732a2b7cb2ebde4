//! Client factory.
//!
//! Builds the hosted-service clients once at startup from configuration.
//! The same Bedrock client serves both traits; callers receive them as
//! separate handles so either can be swapped independently in tests.

use crate::client::{ConverseClient, RetrieveGenerateClient};
use crate::providers::BedrockClient;
use liftrag_core::config::BedrockSettings;
use liftrag_core::AppResult;
use std::sync::Arc;

/// Handles to the two hosted capabilities.
#[derive(Clone)]
pub struct Clients {
    pub converse: Arc<dyn ConverseClient>,
    pub generate: Arc<dyn RetrieveGenerateClient>,
}

/// Create Bedrock clients from settings.
///
/// # Arguments
/// * `settings` - Region, endpoint overrides, timeout and converse attempts
/// * `api_key` - Optional Bedrock API key sent as a bearer token
///
/// # Errors
/// Returns a configuration error if the HTTP client cannot be built.
pub fn create_clients(settings: &BedrockSettings, api_key: Option<&str>) -> AppResult<Clients> {
    let client = Arc::new(BedrockClient::new(
        settings.runtime_url(),
        settings.agent_runtime_url(),
        api_key.map(str::to_string),
        settings.timeout(),
    )?
    .with_max_attempts(settings.max_attempts));

    tracing::debug!(
        "Created Bedrock clients (runtime: {}, agent runtime: {})",
        settings.runtime_url(),
        settings.agent_runtime_url()
    );

    Ok(Clients {
        converse: client.clone(),
        generate: client,
    })
}
