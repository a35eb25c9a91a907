// This is the entry point of the moderation CLI.
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Dispatch the requested command and print its JSON result

use clap::Parser;
use community_moderation::cli::{exit_code, run_command, watch_sweeps, Cli, CliContext, Commands};
use community_moderation::config::AppConfig;
use community_moderation::core::moderation::{
    EnvThreshold, ModerationService, THRESHOLD_ENV_VAR,
};
use community_moderation::infra::moderation::SqliteModerationStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // A bad threshold aborts start-up; later bad values are ignored.
    let policy = Arc::new(EnvThreshold::from_env(THRESHOLD_ENV_VAR)?);

    let store = Arc::new(SqliteModerationStore::new(&config.database_url).await?);
    let service = ModerationService::with_store(store.clone(), policy);

    let ctx = CliContext {
        store,
        service,
        sweep_interval: config.sweep_interval,
    };

    match cli.command {
        Commands::Sweep { watch: true } => watch_sweeps(&ctx).await,
        command => {
            let output = run_command(&ctx, command).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}
