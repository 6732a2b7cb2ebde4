//! Entity-filtered conversational retrieval for liftrag.
//!
//! The pipeline for each turn:
//! - [`normalize`] rewrites the query so the model family reads `PVE`
//! - [`EntityExtractor`] asks the model for elevator entities through tool use
//! - [`FilterBuilder`] turns the first entity into a knowledge-base filter
//! - [`RagOrchestrator`] merges it with the conversation's remembered filter,
//!   makes one retrieve-and-generate call and streams the answer
//!
//! [`ingest`] builds the document corpus the knowledge base is loaded from.

mod deadline;

pub mod entity;
pub mod extract;
pub mod filter;
pub mod ingest;
pub mod normalize;
pub mod rag;
pub mod session;
pub mod stream;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use entity::{remove_duplicates, Entity, ExtractedEntities, UNKNOWN_ENTITY};
pub use extract::{extraction_tool, EntityExtractor, EXTRACTION_TOOL};
pub use filter::{FilterBuilder, ELEVATOR_KEY};
pub use ingest::{build_corpus, load_corpus, write_corpus, CorpusRecord, IngestStats};
pub use normalize::{normalize, MODEL_FAMILY};
pub use rag::{FilterSource, QueryPlan, RagOrchestrator, TurnOptions, TurnReply};
pub use session::{ChatRole, ChatTurn, ConversationContext, SessionState};
pub use stream::TokenStream;
