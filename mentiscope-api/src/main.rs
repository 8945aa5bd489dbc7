//! mentiscope-api - Student growth & readiness service
//!
//! Serves the assessment, dashboard, payment and support endpoints over a
//! local SQLite database. Configuration comes from the command line, the
//! environment and an optional TOML file.

use anyhow::{Context, Result};
use clap::Parser;
use mentiscope_api::config::Cli;
use mentiscope_api::{build_router, AppState, Settings};
use mentiscope_common::db::init_database;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Mentiscope API (mentiscope-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let cli = Cli::parse();
    let settings = Settings::resolve(cli).context("Failed to resolve configuration")?;

    info!("Database path: {}", settings.database_path.display());
    let pool = match init_database(&settings.database_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let bind_address = settings.bind_address.clone();
    let state = AppState::new(pool, settings).context("Failed to build outbound clients")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("mentiscope-api listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("mentiscope-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
