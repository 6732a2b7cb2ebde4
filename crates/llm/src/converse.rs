//! Converse API request/response types.
//!
//! These mirror the Bedrock runtime `Converse` wire format closely enough to
//! serialize requests and deserialize responses with serde. Only the parts
//! liftrag uses are modelled; unknown response fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Converse completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    /// Model id or ARN; sent in the URL path, not the body
    #[serde(skip)]
    pub model_id: String,

    /// Conversation messages
    pub messages: Vec<Message>,

    /// Sampling configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_config: Option<InferenceConfig>,

    /// Tools the model may invoke
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

impl ConverseRequest {
    /// Create a request holding a single user text message.
    pub fn user_text(model_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            messages: vec![Message {
                role: Role::User,
                content: vec![ContentBlock::text(text)],
            }],
            inference_config: None,
            tool_config: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.inference_config
            .get_or_insert_with(InferenceConfig::default)
            .temperature = Some(temperature);
        self
    }

    /// Set the maximum number of output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.inference_config
            .get_or_insert_with(InferenceConfig::default)
            .max_tokens = Some(max_tokens);
        self
    }

    /// Offer a tool to the model.
    pub fn with_tool(mut self, spec: ToolSpec) -> Self {
        self.tool_config
            .get_or_insert_with(ToolConfig::default)
            .tools
            .push(Tool { tool_spec: spec });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

/// One content item of a message.
///
/// Bedrock encodes content items as objects with a single member naming the
/// kind (`{"text": ...}`, `{"toolUse": {...}}`, ...). Kinds liftrag does not
/// use deserialize into a block with every field empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use: Option<ToolUse>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_use: None,
        }
    }
}

/// A structured tool invocation emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUse {
    #[serde(default)]
    pub tool_use_id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub tool_spec: ToolSpec,
}

/// Tool name, description and JSON schema of its input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: ToolInputSchema { json: schema },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    pub json: Value,
}

/// Converse completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub output: ConverseOutput,

    #[serde(default)]
    pub stop_reason: Option<String>,

    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverseOutput {
    #[serde(default)]
    pub message: Option<Message>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl ConverseResponse {
    /// Content items of the output message (empty when there is none).
    pub fn content(&self) -> &[ContentBlock] {
        self.output
            .message
            .as_ref()
            .map(|m| m.content.as_slice())
            .unwrap_or(&[])
    }

    /// First tool invocation named `name`, scanning content items in order.
    pub fn find_tool_use(&self, name: &str) -> Option<&ToolUse> {
        self.content()
            .iter()
            .filter_map(|block| block.tool_use.as_ref())
            .find(|tool_use| tool_use.name == name)
    }
}
