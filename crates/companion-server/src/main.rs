use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use companion_core::db;
use companion_core::repository::SqliteRepository;
use companion_server::auth::TokenSigner;
use companion_server::config::Config;
use companion_server::routes::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "companiond", version, about = "Care Companion API server")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", default_value = "companion.toml")]
    config: String,

    /// Override the configured listen address.
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))?;
    let timezone = config.validate()?;

    let pool = db::establish_connection(&config.storage.path, config.storage.max_connections)
        .await
        .with_context(|| format!("failed to open database at {}", config.storage.path))?;

    let state = AppState {
        repo: Arc::new(SqliteRepository::new(pool)),
        tokens: Arc::new(TokenSigner::new(&config.auth)),
        timezone,
    };
    let app = build_router(state);

    let listen = cli.listen.unwrap_or(config.server.listen);
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    info!("Care Companion server listening on {listen} (calendar timezone {timezone})");

    axum::serve(listener, app).await?;
    Ok(())
}
