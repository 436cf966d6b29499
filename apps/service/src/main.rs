use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use statuswatch::app::Services;
use statuswatch::config::Config;

#[derive(Debug, Parser)]
#[command(version, about = "Availability monitor for HTTP endpoints and ping hosts")]
struct Cli {
    /// Config file, defaults to $XDG_CONFIG_HOME/statuswatch/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Keep statuses in memory instead of the status file
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check all targets on a fixed interval until interrupted (default)
    Run,
    /// Run a single pass and print the merged view as JSON lines
    Check,
    /// Print the stored status of every target
    Status,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logger::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref())
        .context("Failed to load config")?
        .with_env_overrides();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, cli.ephemeral).await,
        Command::Check => check(&config, cli.ephemeral).await,
        Command::Status => status(&config).await,
        Command::Config => {
            println!("{config}");
            Ok(())
        }
    }
}

async fn run(config: &Config, ephemeral: bool) -> Result<()> {
    let services = Services::build(config, ephemeral)?;
    let (join, handle) = services.scheduler().spawn();

    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received, stopping scheduler...");
    handle.stop();
    join.await.context("Scheduler task failed")?;

    Ok(())
}

async fn check(config: &Config, ephemeral: bool) -> Result<()> {
    let services = Services::build(config, ephemeral)?;
    let report = services
        .orchestrator
        .run_registry_pass(services.registry.as_ref())
        .await
        .context("Failed to load targets")?;

    for status in &report.statuses {
        println!("{}", serde_json::to_string(status)?);
    }
    for failure in &report.failures {
        warn!(target_name = %failure.target_name, kind = ?failure.kind, "{}", failure.message);
    }

    Ok(())
}

async fn status(config: &Config) -> Result<()> {
    let services = Services::build(config, false)?;
    let snapshot = services.store.read_all().await;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
