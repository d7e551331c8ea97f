//! # Main Entry Point
//!
//! Initializes ADE:
//! - Domain: Configuration and Types
//! - Infrastructure: Gemini client, web client, process runner
//! - Application: Orchestrator, Agent, Tools, Permissions, Todo, Scaffolder
//! - Interface: Console and subcommand handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;

use crate::application::orchestrator::AutonomousAde;
use crate::application::permissions::{CheckContext, PermissionManager};
use crate::application::scaffold::FileSystemCreator;
use crate::application::todo::TodoList;
use crate::domain::config::AppConfig;
use crate::domain::paths;
use crate::domain::traits::{Embedder, LlmProvider};
use crate::infrastructure::llm::Client as LlmClient;
use crate::interface::commands::create::CreateCommand;
use crate::interface::commands::{agent, create, permissions, todo};
use crate::interface::console::{ConsoleApprover, ConsolePrompter};
use crate::strings::messages;

#[derive(Parser)]
#[command(name = "ade")]
#[command(about = "Agentic Development Environment: an autonomous coding assistant for the terminal")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = paths::CONFIG_FILE)]
    config: PathBuf,

    /// Mirror logs to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check permissions, then start the agent REPL (default)
    Run,
    /// Interactive permission manager
    Permissions,
    /// Interactive todo list
    Todo,
    /// Create folders, files and templates
    Create {
        #[command(subcommand)]
        command: CreateCommand,
    },
}

/// File log at `data/session.log`, plus stderr with `--verbose`.
fn init_tracing(data_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    fs::create_dir_all(data_dir).context("Failed to create data directory")?;
    let log_path = data_dir.join(paths::SESSION_LOG);
    if log_path.exists() {
        let _ = fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(data_dir, paths::SESSION_LOG);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn,html2text=warn"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let console_layer = verbose.then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Environment and configuration
    let _ = dotenvy::dotenv();
    let config = AppConfig::load(&cli.config)?;
    let root = std::env::current_dir().context("Cannot determine working directory")?;

    // 2. Logging
    let _guard = init_tracing(&config.data_dir(), cli.verbose)?;
    tracing::info!("Starting ADE (config: {})", cli.config.display());

    let mut stdout = io::stdout();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, &root).await?,
        Commands::Permissions => {
            let mut manager = PermissionManager::new(CheckContext::new(config, &root));
            permissions::handle_console(&mut manager, &mut ConsolePrompter, &mut stdout, Duration::from_secs(1))
                .await?;
        }
        Commands::Todo => {
            let mut list = TodoList::load(&config.paths.todo_file)?;
            todo::handle_menu(&mut list, &mut ConsolePrompter, &mut stdout)?;
        }
        Commands::Create { command } => {
            let mut creator = FileSystemCreator::new(&root);
            create::handle_create(&command, &mut creator, &mut stdout)?;
        }
    }
    Ok(())
}

/// Permission gate, then the agent REPL.
async fn run(mut config: AppConfig, root: &Path) -> Result<()> {
    let mut stdout = io::stdout();
    let mut manager = PermissionManager::new(CheckContext::new(config.clone(), root));
    permissions::handle_gate(&mut manager, &mut ConsolePrompter, &mut stdout).await?;

    // The gate may have just written the API key
    let env_file = manager.context().env_file();
    if env_file.exists() {
        dotenvy::from_path_override(&env_file)
            .with_context(|| format!("Failed to load {}", env_file.display()))?;
        config.apply_env();
    }
    if config.api_key().is_none() {
        return Err(anyhow!(messages::MISSING_API_KEY));
    }

    let client = Arc::new(LlmClient::new(&config).map_err(|e| anyhow!("{}", e))?);
    let llm: Arc<dyn LlmProvider> = client.clone();
    let embedder: Arc<dyn Embedder> = client;

    let mut ade = AutonomousAde::new(config, llm, Some(embedder), Arc::new(ConsoleApprover)).await?;
    agent::handle_repl(&mut ade, &mut ConsolePrompter, &mut stdout).await
}
