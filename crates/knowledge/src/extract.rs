//! Entity extraction through model tool use.
//!
//! The model is offered a single `extract_entities` tool whose input schema
//! describes the elevator naming convention. Its structured tool input is the
//! extraction result; free text in the reply is ignored.

use crate::deadline::with_deadline;
use crate::entity::ExtractedEntities;
use liftrag_core::AppResult;
use liftrag_llm::{ConverseClient, ConverseRequest, ToolSpec};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Name of the extraction tool.
pub const EXTRACTION_TOOL: &str = "extract_entities";

const EXTRACTION_DESCRIPTION: &str =
    "Extract named entities from the text. If you are not 100% sure of the entity value, use 'unknown'.";

const ELEVATOR_INSTRUCTIONS: &str = "The name of the elevator in spanish following this format: 'Elevador <model-name> <model-number>'.
The 'E' in 'Elevador' is always uppercase.
If pve is in the model name it goes uppercase as in 'PVE'.";

/// Extraction is deterministic.
const TEMPERATURE: f32 = 0.0;

const MAX_TOKENS: u32 = 4000;

/// Tool specification offered to the model.
pub fn extraction_tool() -> ToolSpec {
    ToolSpec::new(EXTRACTION_TOOL, EXTRACTION_DESCRIPTION, extraction_schema())
}

fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "entities": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "Elevator": {
                            "type": "string",
                            "description": ELEVATOR_INSTRUCTIONS
                        }
                    },
                    "required": ["Elevator"]
                }
            }
        },
        "required": ["entities"]
    })
}

/// Turns free text into elevator entities.
pub struct EntityExtractor {
    client: Arc<dyn ConverseClient>,
    model_id: String,
    timeout: Duration,
}

impl EntityExtractor {
    pub fn new(client: Arc<dyn ConverseClient>, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Deadline for the whole extraction call, retries included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Converse request asking the model to call the extraction tool on `text`.
    pub fn request(&self, text: &str) -> ConverseRequest {
        ConverseRequest::user_text(&self.model_id, text)
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_TOKENS)
            .with_tool(extraction_tool())
    }

    /// Extract entities from `text`.
    ///
    /// Returns `Ok(None)` when the model did not call the extraction tool.
    /// A tool input that does not match the entity schema is an
    /// `AppError::Validation`; service failures propagate unchanged.
    #[instrument(skip_all, fields(model = %self.model_id))]
    pub async fn extract(&self, text: &str) -> AppResult<Option<ExtractedEntities>> {
        let request = self.request(text);
        let response =
            with_deadline(self.timeout, "entity extraction", self.client.converse(&request))
                .await?;

        let input = match response.find_tool_use(EXTRACTION_TOOL) {
            Some(tool_use) if !is_blank(&tool_use.input) => &tool_use.input,
            _ => {
                warn!(
                    "No entities found in the response (stop reason: {})",
                    response.stop_reason.as_deref().unwrap_or("none")
                );
                return Ok(None);
            }
        };

        let entities = ExtractedEntities::parse(input)?;
        debug!("Extracted {} entities: {:?}", entities.len(), entities.entities());

        Ok(Some(entities))
    }
}

/// Null, an empty object or an empty array carries no extraction.
fn is_blank(input: &Value) -> bool {
    match input {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
