//! liftrag CLI
//!
//! Main entry point for the liftrag command-line tool.
//! Answers questions about elevator models from a Bedrock knowledge base,
//! narrowing retrieval to the model the question is about.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, ExtractCommand, IngestCommand, PromptsCommand};
use liftrag_core::config::AppConfig;
use liftrag_core::logging;
use std::path::PathBuf;

/// liftrag - conversational answers over an elevator knowledge base
#[derive(Parser, Debug)]
#[command(name = "liftrag")]
#[command(about = "Conversational RAG over an elevator knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "LIFTRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LIFTRAG_CONFIG")]
    config: Option<PathBuf>,

    /// AWS region of the Bedrock endpoints
    #[arg(long, global = true)]
    region: Option<String>,

    /// Knowledge base identifier
    #[arg(short = 'k', long, global = true)]
    knowledge_base: Option<String>,

    /// Generation model ARN
    #[arg(short, long, global = true)]
    model_arn: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive conversation
    Chat(ChatCommand),

    /// Show the entities and filter extracted from a question
    Extract(ExtractCommand),

    /// Build the JSON corpus from a document directory
    Ingest(IngestCommand),

    /// List prompt templates in the workspace
    Prompts(PromptsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::Chat(_) => "chat",
            Commands::Extract(_) => "extract",
            Commands::Ingest(_) => "ingest",
            Commands::Prompts(_) => "prompts",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace, cli.config)
        .context("Failed to load configuration")?
        .with_overrides(
            cli.region,
            cli.knowledge_base,
            cli.model_arn,
            cli.log_level,
            cli.log_json,
            cli.verbose,
            cli.no_color,
        );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)?;

    tracing::info!("liftrag starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Region: {}", config.bedrock.region);

    let command_name = cli.command.name();
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Extract(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config),
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("liftrag {} failed", command_name))
}
