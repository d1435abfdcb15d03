use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use taxpal_core::db::RepositoryRegistry;
use taxpal_db_sqlite::SqliteRepositoryFactory;
use taxpal_server::{AppState, Cli, ServerConfig, create_router, logging};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli)?;
    logging::init(&config.log_level, config.log_file.as_deref())?;

    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));

    let db_config = config.database.db_config();
    info!(
        backend = %db_config.backend,
        db = %db_config.connection_string,
        available = ?registry.available_backends(),
        "opening ledger"
    );
    let repo = registry
        .create(&db_config)
        .await
        .with_context(|| format!("Failed to open {} database", db_config.backend))?;

    let table = config.tax.build_table()?;
    info!(
        year = table.tax_year(),
        status = table.filing_status().as_str(),
        standard_deduction = %table.standard_deduction(),
        "tax table ready"
    );

    let state = Arc::new(AppState::new(Arc::from(repo), table));
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(addr = %config.bind, "taxpal-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("taxpal-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
