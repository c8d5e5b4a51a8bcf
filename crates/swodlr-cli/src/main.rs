//! SWODLR CLI - Main entry point

use clap::Parser;
use std::process;
use std::time::Duration;
use swodlr_cli::{Cli, Commands};
use swodlr_common::logging::{init_logging, LogConfig, LogLevel};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    let Some(ref command) = cli.command else {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    };

    // Verbose switches to debug; otherwise only warnings reach the console
    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Warn };
    let log_config = LogConfig::for_service("swodlr-cli").with_level(level);
    let log_config = log_config.clone().with_env_overrides().unwrap_or(log_config);

    // CLI keeps working without logging
    let _guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = execute_command(command).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(command: &Commands) -> swodlr_cli::Result<()> {
    match command {
        Commands::Ingest {
            s3_url,
            interval,
            local,
        } => swodlr_cli::commands::ingest::run(s3_url, Duration::from_secs(*interval), *local).await,

        Commands::Submit { event } => swodlr_cli::commands::submit::run(event).await,

        Commands::Poll { event } => swodlr_cli::commands::poll::run(event).await,

        Commands::Bootstrap { event } => swodlr_cli::commands::bootstrap::run(event).await,
    }
}
