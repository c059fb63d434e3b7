use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::auth::JwtValidator;
use crate::config::AppConfig;
use crate::database::{DocumentStore, MongoStore};
use crate::server::{self, AppState};

#[derive(Parser)]
#[command(name = "datalake-gateway")]
#[command(about = "Authenticated HTTP gateway for channel queries over the datalake")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Read environment from this file instead of ./.env")]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP gateway (default)")]
    Serve {
        #[arg(long, help = "Listen host, overrides LISTEN_HOST")]
        host: Option<String>,
        #[arg(long, help = "Listen port, overrides LISTEN_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Print the resolved configuration without secrets")]
    Config,

    #[command(about = "Connect to the document store and ping it")]
    Ping,
}

/// Load `--env-file` strictly, or `./.env` when present.
pub fn load_env(cli: &Cli) -> anyhow::Result<()> {
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }
    Ok(())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(config).await
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            config.validate()?;
            Ok(())
        }
        Commands::Ping => {
            let store = MongoStore::connect(&config.database)
                .await
                .context("failed to connect to the document store")?;
            store.ping().await?;
            println!("{}: ok", config.database.name);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting datalake gateway in {:?} mode", config.environment);

    let validator = JwtValidator::from_config(&config.auth)
        .context("failed to load token verification key")?;

    // No partial-service mode: an unreachable store aborts startup.
    let store = MongoStore::connect(&config.database)
        .await
        .context("failed to connect to the document store")?;

    let state = AppState::new(Arc::new(store), Arc::new(validator), config);
    server::serve(state).await
}
