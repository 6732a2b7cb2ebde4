//! Prompts command handler.

use clap::Args;
use liftrag_core::{config::AppConfig, AppResult};
use liftrag_prompt::{list_prompts, PromptDefinition};

/// List prompt templates in the workspace
#[derive(Args, Debug)]
pub struct PromptsCommand {}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let builtin = PromptDefinition::default_answer().id;
        let mut ids: Vec<(String, &str)> = list_prompts(&config.workspace)?
            .into_iter()
            .map(|id| (id, ""))
            .collect();
        if !ids.iter().any(|(id, _)| *id == builtin) {
            ids.push((builtin, " (built-in)"));
        }

        for (id, note) in ids {
            let marker = if id == config.retrieval.prompt_id { "*" } else { " " };
            println!("{} {}{}", marker, id, note);
        }

        Ok(())
    }
}
