#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pollwatch::{Config, Orchestrator};

/// Poll a list of URLs and periodically log their status
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file, defaults to $XDG_CONFIG_HOME/pollwatch/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logger::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_deref()).context("failed to load configuration")?;

    if cli.print_config {
        println!("{config}");
        return Ok(());
    }

    config.validate().context("invalid configuration")?;
    Orchestrator::start(config).await
}
