use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use point_ledger::{
    adapters::{
        database::memory::{MemoryBalanceStore, MemoryHistoryStore},
        http,
    },
    commands::DomainLogic,
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let config = Config::parse();

    let logic = DomainLogic::new(
        Arc::new(MemoryBalanceStore::default()),
        Arc::new(MemoryHistoryStore::default()),
        config.read_consistency,
    );
    let app = http::router(logic);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!(
        listen = %config.listen,
        read_consistency = ?config.read_consistency,
        "point ledger started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("could not listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
