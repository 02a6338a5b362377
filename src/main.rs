use anyhow::Result;
use cadesk_core::{config::Config, migration, server, telemetry};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "cadesk-core")]
#[command(about = "Back-office API for chartered accountants")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Apply pending migrations before serving
        #[arg(long)]
        migrate: bool,
    },
    /// Create the database if needed and apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let prometheus = telemetry::init(&config.telemetry);

    match cli.command.unwrap_or(Command::Serve { migrate: false }) {
        Command::Migrate => migration::run_migrations(&config).await,
        Command::Serve { migrate } => {
            if migrate {
                migration::run_migrations(&config).await?;
            }
            info!(
                environment = %config.environment,
                "Starting {} v{}",
                config.telemetry.service_name,
                env!("CARGO_PKG_VERSION")
            );
            server::run(config, prometheus).await
        }
    }
}
