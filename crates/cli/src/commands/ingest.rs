//! Ingest command handler.

use clap::Args;
use liftrag_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Build the JSON corpus from a document directory
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Directory of documents; subdirectories name the elevator model
    pub source: PathBuf,

    /// Output file (default: .liftrag/corpus.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output stats as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.source);

        let output = match self.output {
            Some(ref path) => path.clone(),
            None => {
                config.ensure_liftrag_dir()?;
                config.liftrag_dir().join("corpus.json")
            }
        };

        let (records, stats) = liftrag_knowledge::build_corpus(&self.source)?;
        liftrag_knowledge::write_corpus(&output, &records)?;

        if self.json {
            let report = serde_json::json!({
                "output": output,
                "records": stats.records,
                "skipped": stats.skipped,
                "paragraphs": stats.paragraphs,
                "models": stats.models,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "Wrote {} documents ({} paragraphs) to {}",
                stats.records,
                stats.paragraphs,
                output.display()
            );
            if stats.skipped > 0 {
                println!("Skipped {} unsupported files", stats.skipped);
            }
            for model in &stats.models {
                println!("  {}", model);
            }
        }

        Ok(())
    }
}
