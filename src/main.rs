mod actors;
mod api;
mod app_system;
mod auth;
mod cli;
mod clients;
mod config;
mod domain;
mod error;
mod messages;
mod notify;
mod order_list;
mod query_cache;
mod view;

#[cfg(test)]
mod mock_framework;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use crate::app_system::setup_tracing;
use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the config file and flags still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    info!(command = ?cli.command, "Starting order desk");
    let result = cli::run(cli).await;
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}
