//! Conversational retrieval-augmented answering.

pub mod orchestrator;
pub mod types;

pub use orchestrator::{QueryPlan, RagOrchestrator};
pub use types::{FilterSource, TurnOptions, TurnReply, DEFAULT_TOP_K};
