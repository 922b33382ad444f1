// OBS tool - exercise the OBS object store plugin from the command line

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{execute_exists, execute_get, execute_ls, execute_put, execute_rm, execute_sign};
use obs_plugin::oss::ENDPOINT_KEY;
use obs_plugin::ObsObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so that `get` can stream to stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = HashMap::from([(ENDPOINT_KEY.to_string(), cli.endpoint.clone())]);
    let store = ObsObjectStore::new(&config).context("Failed to initialize OBS object store")?;

    match &cli.command {
        Commands::Put(args) => execute_put(args, &store).await?,
        Commands::Get(args) => execute_get(args, &store).await?,
        Commands::Exists(args) => execute_exists(args, &store).await?,
        Commands::Ls(args) => execute_ls(args, &store).await?,
        Commands::Rm(args) => execute_rm(args, &store).await?,
        Commands::Sign(args) => execute_sign(args, &store).await?,
    }

    Ok(())
}
