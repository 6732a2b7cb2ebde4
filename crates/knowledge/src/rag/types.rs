//! Turn inputs and outputs.

use crate::entity::ExtractedEntities;
use crate::stream::TokenStream;
use liftrag_core::config::{AppConfig, MAX_TOP_K};
use liftrag_core::{AppError, AppResult};
use liftrag_llm::MetadataFilter;
use serde::Serialize;
use std::collections::HashMap;

/// Default number of retrieved chunks.
pub const DEFAULT_TOP_K: u32 = 6;

/// Per-turn generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOptions {
    /// Model that writes the answer
    pub model_arn: String,

    /// Number of chunks retrieved, 1 to 100
    pub top_k: u32,

    /// Generation template with `$search_results$` and `$input$`; the
    /// service default applies when absent
    pub prompt_template: Option<String>,
}

impl TurnOptions {
    pub fn new(model_arn: impl Into<String>) -> Self {
        Self {
            model_arn: model_arn.into(),
            top_k: DEFAULT_TOP_K,
            prompt_template: None,
        }
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Options from configuration, rendering the configured prompt when enabled.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let mut options =
            Self::new(config.bedrock.model_arn.clone()).with_top_k(config.retrieval.top_k);

        if config.retrieval.use_prompt_template {
            let definition =
                liftrag_prompt::load_prompt_or_default(&config.workspace, &config.retrieval.prompt_id)?;
            let built = liftrag_prompt::build_prompt(&definition, HashMap::new())?;
            tracing::debug!("Using prompt template '{}'", built.metadata.source_prompt_id);
            options.prompt_template = Some(built.template);
        }

        Ok(options)
    }

    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(AppError::Validation(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_TOP_K, self.top_k
            )));
        }
        if self.model_arn.trim().is_empty() {
            return Err(AppError::Validation("Model ARN cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Where the filter sent with a turn came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSource {
    /// Built from this turn's query
    Current,
    /// Carried over from an earlier turn
    Remembered,
    /// Unfiltered retrieval
    None,
}

/// Result of one conversational turn.
pub struct TurnReply {
    /// Generation service session, reused by the next turn
    pub session_id: String,

    /// Filter sent with the request
    pub filter: Option<MetadataFilter>,

    pub filter_source: FilterSource,

    /// Extraction outcome, absent on an extraction miss
    pub entities: Option<ExtractedEntities>,

    /// Full answer text
    pub answer: String,

    /// The answer as paced word tokens
    pub tokens: TokenStream,
}

impl std::fmt::Debug for TurnReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnReply")
            .field("session_id", &self.session_id)
            .field("filter", &self.filter)
            .field("filter_source", &self.filter_source)
            .field("entities", &self.entities)
            .field("answer", &self.answer)
            .finish_non_exhaustive()
    }
}
