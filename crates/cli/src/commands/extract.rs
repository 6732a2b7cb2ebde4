//! Extract command handler.
//!
//! Shows what the pipeline would filter on for a question, without
//! calling the knowledge base.

use clap::Args;
use liftrag_core::{config::AppConfig, AppResult};
use liftrag_knowledge::{normalize, EntityExtractor, FilterBuilder};

/// Show the entities and filter extracted from a question
#[derive(Args, Debug)]
pub struct ExtractCommand {
    /// The question to analyze
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExtractCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing extract command");

        let clients = super::clients(config)?;
        let extractor =
            EntityExtractor::new(clients.converse, config.bedrock.extraction_model_id.clone())
                .with_timeout(config.bedrock.timeout());
        let filters = FilterBuilder::from_settings(&config.filter)?;

        let query = normalize(&self.question);
        let entities = extractor.extract(&query).await?;
        let filter = filters.build(entities.as_ref());

        if self.json {
            let output = serde_json::json!({
                "query": query,
                "entities": entities,
                "filter": filter,
                "strict": filters.is_strict(),
                "allowedValues": filters.allowed_values(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Query: {}", query);
        if filters.is_strict() {
            println!("Known models: {}", filters.allowed_values().join(", "));
        }
        match entities {
            Some(ref extracted) if !extracted.is_empty() => {
                for entity in extracted.entities() {
                    println!(
                        "Entity: {}",
                        entity.elevator.as_deref().unwrap_or("(absent)")
                    );
                }
            }
            Some(_) => println!("Entities: none"),
            None => println!("Entities: extraction tool not called"),
        }
        match filter {
            Some(filter) => println!("Filter: {}", serde_json::to_string(&filter)?),
            None => println!("Filter: none"),
        }

        Ok(())
    }
}
