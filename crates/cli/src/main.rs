//! DeskPilot CLI entry point.
//!
//! Commands:
//! - `serve`: start the Q&A service, the ticket assistant, or both
//! - `doctor`: report which credentials and settings are in place

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::serve::ServiceArg;

#[derive(Parser)]
#[command(
    name = "deskpilot",
    about = "DeskPilot: knowledge-base Q&A and helpdesk ticket assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP services
    Serve {
        /// Which service to run
        #[arg(short, long, value_enum, default_value_t = ServiceArg::All)]
        service: ServiceArg,

        /// Listen on this port instead of the configured ones
        #[arg(short, long)]
        port: Option<u16>,

        /// Config file (default: ~/.deskpilot/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Diagnose configuration
    Doctor {
        /// Config file (default: ~/.deskpilot/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve {
            service,
            port,
            config,
        } => commands::serve::run(service, port, config).await?,
        Commands::Doctor { config } => commands::doctor::run(config)?,
    }

    Ok(())
}
