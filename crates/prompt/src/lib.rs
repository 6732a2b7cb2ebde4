//! Prompt templates for liftrag.
//!
//! The knowledge base generates answers from a text template containing the
//! service placeholders `$search_results$` and `$input$`. This crate provides:
//! - YAML-based template definitions under `.liftrag/prompts/`
//! - Handlebars rendering of local variables (placeholders pass through)
//! - A built-in default for elevator specifications

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt, load_prompt_or_default};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptDefinition, INPUT_MARKER, SEARCH_RESULTS_MARKER,
};
