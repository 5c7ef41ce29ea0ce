mod cli;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;
use firstaid_guide::config::GuideConfig;
use firstaid_guide::guide::pathway::QuestionStrategy;

const DEFAULT_SENDER: &str = "console:local";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Message to send as the sender, then exit
    #[arg(short, long)]
    input: Option<String>,

    /// Sender identifier to text as
    #[arg(short, long, default_value = DEFAULT_SENDER)]
    sender: String,

    /// Where follow-up questions come from: pathway or dynamic
    #[arg(long)]
    strategy: Option<QuestionStrategy>,

    /// Seed for reproducible question and reply selection
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a guided conversation
    Chat {
        /// Message to send as the sender, then exit
        #[arg(short, long)]
        input: Option<String>,

        /// Sender identifier to text as
        #[arg(short, long)]
        sender: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let (input, sender, verbose) = match cli.command {
        Some(Commands::Chat { input, sender, verbose }) => (
            input.or(cli.input),
            sender.unwrap_or(cli.sender),
            verbose || cli.verbose,
        ),
        None => (cli.input, cli.sender, cli.verbose),
    };

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting first-aid guide");

    let mut config = GuideConfig::from_env()?;
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let mut chat_context = ChatContext::new(Box::new(io::stdout()), input, true, sender, &config)?;
    chat_context.run().await
}
