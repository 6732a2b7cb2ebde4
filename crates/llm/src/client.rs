//! Client abstractions for the two hosted capabilities liftrag depends on.
//!
//! The entity extractor talks to a `ConverseClient`; the orchestrator talks
//! to a `RetrieveGenerateClient`. Both are injected as trait objects so tests
//! can substitute doubles for the hosted services.

use crate::converse::{ConverseRequest, ConverseResponse};
use crate::retrieve::{RetrieveAndGenerateRequest, RetrieveAndGenerateResponse};
use liftrag_core::AppResult;

/// Tool-call capable language model.
#[async_trait::async_trait]
pub trait ConverseClient: Send + Sync {
    /// Get the provider name (e.g., "bedrock").
    fn provider_name(&self) -> &str;

    /// Run one non-streaming converse call.
    async fn converse(&self, request: &ConverseRequest) -> AppResult<ConverseResponse>;
}

/// Knowledge-base retrieval followed by grounded generation.
#[async_trait::async_trait]
pub trait RetrieveGenerateClient: Send + Sync {
    /// Run one retrieve-and-generate call.
    ///
    /// Implementations must not retry: generation may have billable side effects.
    async fn retrieve_and_generate(
        &self,
        request: &RetrieveAndGenerateRequest,
    ) -> AppResult<RetrieveAndGenerateResponse>;
}
