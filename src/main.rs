use anyhow::{Context, Result};
use axum::Router;
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    // --- .env first, so it feeds both logging and config ---
    dotenv::dotenv().ok();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::debug!("Starting drop-upload with config: {:?}", cfg);

    // --- Ensure storage directory exists (once, not per request) ---
    let storage = services::storage_service::StorageService::new(cfg.storage_dir.clone());
    storage
        .ensure_storage_dir()
        .await
        .with_context(|| format!("creating storage directory {}", cfg.storage_dir.display()))?;
    tracing::info!("Storing uploads in {}", cfg.storage_dir.display());

    // --- Build router ---
    let app: Router = routes::routes::routes(&cfg.storage_dir).with_state(storage);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err).with_context(|| format!("binding {}", addr)),
    };

    tracing::debug!("Bound to {}", listener.local_addr()?);
    tracing::info!("Server is running at {}", cfg.public_url());
    axum::serve(listener, app).await?;

    Ok(())
}
