//! Hosted model integration for liftrag.
//!
//! This crate wraps the two Amazon Bedrock capabilities liftrag consumes
//! behind small async traits:
//! - **Converse** with tool use, for structured entity extraction
//! - **RetrieveAndGenerate**, for knowledge-base grounded answers
//!
//! # Example
//! ```no_run
//! use liftrag_llm::{ConverseClient, ConverseRequest, BedrockClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BedrockClient::new(
//!     "https://bedrock-runtime.us-east-1.amazonaws.com",
//!     "https://bedrock-agent-runtime.us-east-1.amazonaws.com",
//!     std::env::var("AWS_BEARER_TOKEN_BEDROCK").ok(),
//!     Duration::from_secs(60),
//! )?;
//! let request = ConverseRequest::user_text("amazon.nova-pro-v1:0", "Hola");
//! let response = client.converse(&request).await?;
//! println!("{:?}", response.content());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod converse;
pub mod factory;
pub mod providers;
pub mod retrieve;

// Re-export main types
pub use client::{ConverseClient, RetrieveGenerateClient};
pub use converse::{
    ContentBlock, ConverseOutput, ConverseRequest, ConverseResponse, Message, Role, TokenUsage,
    ToolSpec, ToolUse,
};
pub use factory::{create_clients, Clients};
pub use providers::BedrockClient;
pub use retrieve::{
    FilterClause, MetadataFilter, RetrieveAndGenerateRequest, RetrieveAndGenerateResponse,
};
