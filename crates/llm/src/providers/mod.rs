//! Provider implementations of the client traits.

pub mod bedrock;

pub use bedrock::BedrockClient;
