//! crosspost CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let working_dir = config::resolve_working_dir(cli.working_dir.clone())?;

    // Initialize logging; the flag wins over the config file
    let log_level = match cli.log_level.clone() {
        Some(level) => level,
        None => AppConfig::load(cli.config.as_deref(), &working_dir)
            .map(|config| config.general.log_level)
            .unwrap_or_else(|_| "info".to_string()),
    };
    init_logging(&log_level)?;

    let ctx = commands::Context {
        config_path: cli.config,
        working_dir,
    };

    // Execute command
    match cli.command {
        Commands::Publish(args) => commands::publish::execute(args, ctx).await,
        Commands::Verify(args) => commands::verify::execute(args, ctx).await,
        Commands::Changes(args) => commands::changes::execute(args, ctx).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, ctx).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
