//! Chat command handler.
//!
//! Interactive loop: one line per turn, answers streamed word by word.
//! Failed turns are reported and the conversation continues.

use super::ask::stream_answer;
use clap::Args;
use liftrag_core::{config::AppConfig, AppResult};
use liftrag_knowledge::{ChatRole, ConversationContext, TurnOptions};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Commands: /history, /reset, /exit";

/// Interactive conversation
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Number of chunks to retrieve (1-100)
    #[arg(long)]
    pub top_k: Option<u32>,
}

enum Input<'a> {
    Question(&'a str),
    History,
    Reset,
    Exit,
    Help,
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/exit" | "/quit" => Input::Exit,
        "/reset" => Input::Reset,
        "/history" => Input::History,
        "/help" => Input::Help,
        question => Input::Question(question),
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat session");

        let rag = super::orchestrator(config)?;
        let mut options = TurnOptions::from_config(config)?;
        if let Some(top_k) = self.top_k {
            options = options.with_top_k(top_k);
        }

        let mut ctx = ConversationContext::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("liftrag chat. {}", HELP);

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line) {
                Input::Empty => continue,
                Input::Exit => break,
                Input::Help => println!("{}", HELP),
                Input::Reset => {
                    ctx.reset();
                    println!("Conversation reset.");
                }
                Input::History => {
                    println!(
                        "Conversation {} started {}",
                        ctx.id(),
                        ctx.started_at().format("%Y-%m-%d %H:%M:%S UTC")
                    );
                    for turn in ctx.transcript() {
                        let who = match turn.role {
                            ChatRole::User => "you",
                            ChatRole::Assistant => "liftrag",
                        };
                        println!("[{}] {}: {}", turn.at.format("%H:%M:%S"), who, turn.content);
                    }
                }
                Input::Question(question) => match rag.respond(&mut ctx, question, &options).await {
                    Ok(reply) => stream_answer(reply).await?,
                    Err(e) => {
                        tracing::warn!("Turn failed: {}", e);
                        eprintln!("Error: {}", e);
                    }
                },
            }
        }

        tracing::info!(
            "Chat session {} ended after {} messages",
            ctx.id(),
            ctx.transcript().len()
        );
        Ok(())
    }
}
