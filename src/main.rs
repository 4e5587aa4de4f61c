mod config;
mod db;
mod device;
mod error;
mod journal;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Config};
use crate::device::JsonDeviceStore;
use crate::journal::repository::{DynPostRepository, SqlitePostRepository};
use crate::state::AppState;
use crate::storage::FsImageStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Ensure the image bucket exists
    std::fs::create_dir_all(config.images_path())?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Build app state
    let images = Arc::new(FsImageStore::new(config.images_path().clone()));
    let repo: DynPostRepository = Arc::new(SqlitePostRepository::new(pool, images));
    let device = Arc::new(JsonDeviceStore::load_or_default(data_dir.join("device.json")));

    let state = AppState { config: config.clone(), repo, device };

    let app = routes::app(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);
    if let Ok(ip) = local_ip_address::local_ip() {
        tracing::info!("On the household network: http://{}:{}", ip, config.server.port);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
