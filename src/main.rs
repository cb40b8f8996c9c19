use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, path::Path};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        environment = ?cfg.environment,
        "Starting photo-volume with config: {:?}",
        cfg
    );

    // --- Ensure upload directory exists ---
    let upload_path = &cfg.photo_upload.upload_path;
    if !Path::new(upload_path).exists() {
        tokio::fs::create_dir_all(upload_path).await?;
        tracing::info!("Created upload directory at {}", upload_path.display());
    }

    // --- Identity database ---
    let db = db::connect(&cfg.database_url).await?;
    db::DatabaseInitializer::new(db.clone(), &cfg.migrations_dir)
        .initialize_database()
        .await?;

    if migrate {
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Build router ---
    let state = state::AppState::new(db, &cfg.photo_upload);
    let app: Router = routes::routes::routes(cfg.photo_upload.max_upload_bytes).with_state(state);

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
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
