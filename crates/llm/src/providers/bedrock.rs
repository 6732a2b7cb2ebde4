//! Amazon Bedrock provider.
//!
//! Talks JSON over HTTPS to the two Bedrock services liftrag needs:
//! - bedrock-runtime `POST /model/{modelId}/converse` (entity extraction)
//! - bedrock-agent-runtime `POST /retrieveAndGenerate` (answers)
//!
//! Requests authenticate with a Bedrock API key sent as a bearer token.
//! Converse calls are read-only and retried with exponential backoff on
//! transient errors (throttling, server errors, transport failures and
//! timeouts). Retrieve-and-generate calls are sent exactly once.

use crate::client::{ConverseClient, RetrieveGenerateClient};
use crate::converse::{ConverseRequest, ConverseResponse};
use crate::retrieve::{RetrieveAndGenerateRequest, RetrieveAndGenerateResponse};
use liftrag_core::{AppError, AppResult};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default attempts for converse calls
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Bedrock HTTP client.
#[derive(Debug, Clone)]
pub struct BedrockClient {
    /// bedrock-runtime base URL
    runtime_url: String,

    /// bedrock-agent-runtime base URL
    agent_runtime_url: String,

    /// Bearer token, if any
    api_key: Option<String>,

    /// HTTP client
    client: reqwest::Client,

    /// Deadline for a whole call
    timeout: Duration,

    /// Attempts for converse calls
    max_attempts: u32,
}

impl BedrockClient {
    /// Create a client for explicit base URLs.
    ///
    /// `timeout` bounds a single-shot call. Converse attempts each get an
    /// equal share of it so a timed-out attempt can still be retried.
    pub fn new(
        runtime_url: impl Into<String>,
        agent_runtime_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            runtime_url: runtime_url.into(),
            agent_runtime_url: agent_runtime_url.into(),
            api_key,
            client,
            timeout,
            max_attempts: MAX_ATTEMPTS,
        })
    }

    /// Override the number of converse attempts (minimum 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Timeout for one converse attempt.
    fn attempt_timeout(&self) -> Duration {
        self.timeout / self.max_attempts
    }

    /// URL of the converse endpoint for `model_id`.
    ///
    /// The model id is pushed as a single path segment so ARNs are escaped.
    fn converse_url(&self, model_id: &str) -> AppResult<Url> {
        let mut url = parse_base(&self.runtime_url)?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Invalid runtime URL: {}", self.runtime_url)))?
            .pop_if_empty()
            .push("model")
            .push(model_id)
            .push("converse");
        Ok(url)
    }

    fn retrieve_and_generate_url(&self) -> AppResult<Url> {
        let mut url = parse_base(&self.agent_runtime_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!(
                    "Invalid agent runtime URL: {}",
                    self.agent_runtime_url
                ))
            })?
            .pop_if_empty()
            .push("retrieveAndGenerate");
        Ok(url)
    }

    /// POST `body` to `url` once and decode the JSON reply.
    ///
    /// Throttling, server errors and transport failures come back as
    /// transient errors; any other refusal is `AppError::Rejected`.
    async fn post_once<B, R>(&self, url: &Url, body: &B, timeout: Duration) -> AppResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut builder = self.client.post(url.clone()).timeout(timeout).json(body);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(format!("Request to {} timed out after {:?}", url, timeout))
            } else {
                AppError::ExternalService(format!("Failed to send request to Bedrock: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("Bedrock API error ({}): {}", status, error_text);
            return Err(if is_retryable_status(status) {
                AppError::ExternalService(message)
            } else {
                AppError::Rejected(message)
            });
        }

        response.json::<R>().await.map_err(|e| {
            AppError::Serialization(format!("Failed to parse Bedrock response: {}", e))
        })
    }

    /// POST with retry and exponential backoff on transient errors.
    #[instrument(skip_all, fields(url = %url))]
    async fn post_with_retries<B, R>(&self, url: &Url, body: &B) -> AppResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let timeout = self.attempt_timeout();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.post_once(url, body, timeout).await {
                Ok(decoded) => return Ok(decoded),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                    warn!(
                        "Bedrock call failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, self.max_attempts, backoff_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn parse_base(base: &str) -> AppResult<Url> {
    Url::parse(base).map_err(|e| AppError::Config(format!("Invalid endpoint URL {}: {}", base, e)))
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait::async_trait]
impl ConverseClient for BedrockClient {
    fn provider_name(&self) -> &str {
        "bedrock"
    }

    async fn converse(&self, request: &ConverseRequest) -> AppResult<ConverseResponse> {
        let url = self.converse_url(&request.model_id)?;
        debug!("Sending converse request for model {}", request.model_id);

        let response: ConverseResponse = self.post_with_retries(&url, request).await?;

        if let Some(ref usage) = response.usage {
            debug!(
                "Converse usage - input: {}, output: {}, total: {}",
                usage.input_tokens, usage.output_tokens, usage.total_tokens
            );
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl RetrieveGenerateClient for BedrockClient {
    async fn retrieve_and_generate(
        &self,
        request: &RetrieveAndGenerateRequest,
    ) -> AppResult<RetrieveAndGenerateResponse> {
        let url = self.retrieve_and_generate_url()?;
        debug!(
            "Sending retrieveAndGenerate request (kb: {}, filtered: {}, session: {})",
            request.knowledge_base_id,
            request.filter.is_some(),
            request.session_id.is_some()
        );

        self.post_once(&url, &request.to_wire(), self.timeout).await
    }
}
