//! Ask command handler.
//!
//! Runs one conversational turn and prints the answer.

use clap::Args;
use futures::StreamExt;
use liftrag_core::{config::AppConfig, AppError, AppResult};
use liftrag_knowledge::{ConversationContext, TurnOptions, TurnReply};
use std::io::Write;
use std::path::PathBuf;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Number of chunks to retrieve (1-100)
    #[arg(long)]
    pub top_k: Option<u32>,

    /// Print the answer at once instead of word by word
    #[arg(long)]
    pub no_stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self.question()?;
        let rag = super::orchestrator(config)?;

        let mut options = TurnOptions::from_config(config)?;
        if let Some(top_k) = self.top_k {
            options = options.with_top_k(top_k);
        }

        let mut ctx = ConversationContext::new();
        let reply = rag.respond(&mut ctx, &question, &options).await?;

        if self.json {
            print_json(&reply)
        } else if self.no_stream {
            println!("{}", reply.answer);
            Ok(())
        } else {
            stream_answer(reply).await
        }
    }

    fn question(&self) -> AppResult<String> {
        let text = match (&self.question, &self.file) {
            (Some(question), _) => question.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read question file {:?}: {}", path, e))
            })?,
            (None, None) => return Err(AppError::Config("No question provided".to_string())),
        };

        if text.trim().is_empty() {
            return Err(AppError::Validation("Question cannot be empty".to_string()));
        }
        Ok(text.trim().to_string())
    }
}

fn print_json(reply: &TurnReply) -> AppResult<()> {
    let output = serde_json::json!({
        "answer": reply.answer,
        "sessionId": reply.session_id,
        "filter": reply.filter,
        "filterSource": reply.filter_source,
        "entities": reply.entities,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Write paced tokens to stdout as they arrive.
pub(crate) async fn stream_answer(reply: TurnReply) -> AppResult<()> {
    let mut tokens = reply.tokens;
    let mut stdout = std::io::stdout();

    while let Some(token) = tokens.next().await {
        write!(stdout, "{}", token)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}
