//! Retrieval-generation orchestration.
//!
//! One turn: normalize the query, extract entities, build a filter, fall back
//! to the conversation's remembered filter, then make exactly one
//! retrieve-and-generate call and stream the answer back.

use crate::deadline::with_deadline;
use crate::entity::ExtractedEntities;
use crate::extract::EntityExtractor;
use crate::filter::FilterBuilder;
use crate::normalize::normalize;
use crate::rag::types::{FilterSource, TurnOptions, TurnReply};
use crate::session::ConversationContext;
use crate::stream::TokenStream;
use liftrag_core::{AppConfig, AppResult};
use liftrag_llm::{Clients, MetadataFilter, RetrieveAndGenerateRequest, RetrieveGenerateClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Entities and filter derived from a single query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Normalized query text
    pub query: String,
    pub entities: Option<ExtractedEntities>,
    pub filter: Option<MetadataFilter>,
}

pub struct RagOrchestrator {
    extractor: EntityExtractor,
    filters: FilterBuilder,
    generator: Arc<dyn RetrieveGenerateClient>,
    knowledge_base_id: String,
    timeout: Duration,
    pacing: Duration,
}

impl RagOrchestrator {
    pub fn new(
        extractor: EntityExtractor,
        filters: FilterBuilder,
        generator: Arc<dyn RetrieveGenerateClient>,
        knowledge_base_id: impl Into<String>,
    ) -> Self {
        Self {
            extractor,
            filters,
            generator,
            knowledge_base_id: knowledge_base_id.into(),
            timeout: Duration::from_secs(60),
            pacing: Duration::ZERO,
        }
    }

    /// Deadline for the generation call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay after each streamed token.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Wire the pipeline from configuration and prebuilt clients.
    pub fn from_config(config: &AppConfig, clients: Clients) -> AppResult<Self> {
        let timeout = config.bedrock.timeout();
        let filters = FilterBuilder::from_settings(&config.filter)?;

        let extractor =
            EntityExtractor::new(clients.converse, config.bedrock.extraction_model_id.clone())
                .with_timeout(timeout);

        Ok(Self::new(
            extractor,
            filters,
            clients.generate,
            config.knowledge_base_id()?,
        )
        .with_timeout(timeout)
        .with_pacing(Duration::from_millis(config.chat.pacing_ms)))
    }

    /// Normalize, extract and build the filter for `query`, without generating.
    pub async fn plan(&self, query: &str) -> AppResult<QueryPlan> {
        let query = normalize(query);
        let entities = self.extractor.extract(&query).await?;
        let filter = self.filters.build(entities.as_ref());

        Ok(QueryPlan {
            query,
            entities,
            filter,
        })
    }

    /// Answer one turn of `ctx`.
    ///
    /// The remembered filter and session id are only updated once generation
    /// succeeds; a failed turn leaves the conversation state untouched.
    #[instrument(name = "turn", skip_all, fields(conversation = %ctx.id()))]
    pub async fn respond(
        &self,
        ctx: &mut ConversationContext,
        query: &str,
        options: &TurnOptions,
    ) -> AppResult<TurnReply> {
        options.validate()?;
        ctx.push_user(query);

        let plan = self.plan(query).await?;

        let (filter, filter_source) = match plan.filter {
            Some(filter) => (Some(filter), FilterSource::Current),
            None => match ctx.state().last_filter() {
                Some(remembered) => (Some(remembered.clone()), FilterSource::Remembered),
                None => (None, FilterSource::None),
            },
        };

        info!("Querying knowledge base with {:?} filter: {:?}", filter_source, filter);

        let request = RetrieveAndGenerateRequest::new(
            plan.query,
            &self.knowledge_base_id,
            &options.model_arn,
            options.top_k,
        )
        .with_filter(filter.clone())
        .with_prompt_template(options.prompt_template.clone())
        .with_session_id(ctx.state().session_id().map(str::to_string));

        let response = with_deadline(
            self.timeout,
            "retrieve and generate",
            self.generator.retrieve_and_generate(&request),
        )
        .await?;

        let state = ctx.state_mut();
        if let Some(ref filter) = filter {
            state.set_last_filter(filter.clone());
        }
        if response.session_id.is_empty() {
            tracing::warn!("Generation response carried no session id");
        } else {
            state.set_session_id(response.session_id.clone());
        }

        let answer = response.text().to_string();
        ctx.push_assistant(answer.clone());

        Ok(TurnReply {
            session_id: response.session_id,
            filter,
            filter_source,
            entities: plan.entities,
            tokens: TokenStream::new(&answer, self.pacing),
            answer,
        })
    }
}
