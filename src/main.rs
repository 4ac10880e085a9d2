use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gator::commands::{Command, Commands, State};
use gator::config::Config;
use gator::db::Database;
use gator::fetcher::Fetcher;

#[derive(Parser, Debug)]
#[command(name = "gator", version)]
#[command(about = "Command-line RSS feed aggregator", long_about = None)]
#[command(after_help = command_help())]
struct Cli {
    /// Config file (defaults to ~/.gatorconfig.json)
    #[arg(long, env = "GATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Command to run
    command: String,

    /// Command arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn command_help() -> String {
    format!("Commands: {}", Commands::default_registry().names().join(", "))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gator=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("couldn't read config {}", config_path.display()))?;
    debug!("Loaded config from {}", config_path.display());

    let db = Database::new(&config.db_url)
        .await
        .with_context(|| format!("couldn't connect to {}", config.db_url))?;
    db.initialize().await.context("couldn't initialize database")?;

    let mut state = State {
        config,
        config_path,
        db,
        fetcher: Fetcher::new()?,
    };

    let commands = Commands::default_registry();
    let cmd = Command {
        name: cli.command,
        args: cli.args,
    };
    let result = commands.run(&mut state, &cmd).await;

    // Flush pending writes before the process exits
    state.db.close().await;
    result
}
