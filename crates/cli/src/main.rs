//! repokit - Application entry point
//!
//! CLI-based entry point that dispatches to the db, develop and deploy commands.

use clap::Parser;

use common::{telemetry::init_tracing, ToolConfig};
use repokit::{
    cli::{Cli, Commands},
    commands,
};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing (verbose mode sets debug level)
    init_tracing(cli.verbose);

    // Load configuration
    let config = ToolConfig::from_env();
    tracing::debug!(?config, "Configuration loaded");

    // Execute command
    let result = match cli.command {
        Commands::Db(args) => commands::db::execute(args, config).await,
        Commands::Develop(args) => commands::develop::execute(args, config).await,
        Commands::Deploy(args) => commands::deploy::execute(args, config).await,
    };

    // Handle errors
    if let Err(e) = result {
        tracing::error!(code = e.code(), "Command failed: {}", e);
        std::process::exit(1);
    }
}
