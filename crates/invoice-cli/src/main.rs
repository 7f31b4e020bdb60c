//! Invoice CLI - command-line client for the invoice processing service
//!
//! Sign in, upload invoices and browse the exports they produced.

mod cli;
mod commands;
mod config_profiles;
mod error;
mod session_store;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::ClientContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::health::run_health;
use crate::commands::history::run_history;
use crate::commands::invoice::{run_delete, run_show};
use crate::commands::upload::run_upload;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "invoice=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        command,
        profile,
        api_url,
    } = Cli::parse();
    let profile = profile.as_deref();

    match command {
        Commands::Auth { command } => {
            run_auth(command, &ClientContext::load(profile, api_url)?).await?;
        }
        Commands::Upload { files, format } => {
            let context = ClientContext::load(profile, api_url)?;
            run_upload(&context, &files, format.into()).await?;
        }
        Commands::History { json } => {
            run_history(&ClientContext::load(profile, api_url)?, json).await?;
        }
        Commands::Show { id, json } => {
            run_show(&ClientContext::load(profile, api_url)?, &id, json).await?;
        }
        Commands::Delete { id } => {
            run_delete(&ClientContext::load(profile, api_url)?, &id).await?;
        }
        Commands::Health => run_health(&ClientContext::load(profile, api_url)?).await?,
        Commands::Config { command } => run_config(command, profile, api_url)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
