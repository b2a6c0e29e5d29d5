//! services/dashboard/src/bin/jaison.rs

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dashboard_lib::{
    cli::{commands::{Cli, Commands}, execute, shell::run_shell, state::AppState},
    config::Config,
    error::DashboardError,
};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error: {}", DashboardError::from(e));
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    debug!("Configuration loaded");

    // --- 2. Build the Shared AppState ---
    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialise: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // --- 3. Restore Any Remembered Session ---
    state.session.bootstrap().await;

    // --- 4. Run the Command ---
    let result = match cli.command {
        Commands::Shell => run_shell(&state).await,
        command => execute(command, &state).await,
    };
    state.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
