//! VaultWatch command line interface
//!
//! Thin presentation layer over the library crates: parses arguments, wires
//! the production adapters together, and renders results. All behavior
//! lives below this crate.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "vaultwatch", version, about = "Destiny 2 progression companion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Authorize with Bungie.net through the browser
    Login,
    /// Fetch a player's profile and print progression summaries
    Fetch {
        /// Bungie name tag, e.g. "Guardian#1234"
        tag: String,
        /// Override the profile components requested from the API
        #[arg(long)]
        components: Option<String>,
        /// Item hash to treat as exotic; repeat for each hash
        #[arg(long = "exotic-hash")]
        exotic_hashes: Vec<u64>,
    },
    /// Show session, cache, and API reachability state
    Status,
    /// Delete the stored session
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logging first so .env loading is visible.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vaultwatch=info")),
        )
        .with_target(false)
        .init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(_) => tracing::debug!("No .env file found"),
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Login => commands::login().await,
        Command::Fetch { tag, components, exotic_hashes } => {
            commands::fetch(&tag, components.as_deref(), &exotic_hashes).await
        }
        Command::Status => commands::status().await,
        Command::Logout => commands::logout().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_accepts_repeated_exotic_hashes() {
        let cli = Cli::parse_from([
            "vaultwatch",
            "fetch",
            "Guardian#1234",
            "--exotic-hash",
            "111",
            "--exotic-hash",
            "222",
        ]);
        match cli.command {
            Command::Fetch { tag, exotic_hashes, components } => {
                assert_eq!(tag, "Guardian#1234");
                assert_eq!(exotic_hashes, vec![111, 222]);
                assert!(components.is_none());
            }
            other => panic!("parsed unexpected command: {other:?}"),
        }
    }
}
