use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use services::{remote_sync::RemoteSync, store::DatasetStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;
    let addr = config.bind_addr;

    // Build our application state
    let state = Arc::new(AppState::new(config));

    let app = routes::app(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state, injected into every handler.
///
/// The dataset store is only touched under its mutex. Dataframe work runs on
/// the blocking pool while the guard is held, so concurrent cleans queue up
/// instead of losing updates.
pub struct AppState {
    config: config::Config,
    store: Mutex<DatasetStore>,
    remote: RemoteSync,
}

impl AppState {
    fn new(config: config::Config) -> Self {
        let remote = RemoteSync::new(config.supabase.clone());
        Self {
            config,
            store: Mutex::new(DatasetStore::new()),
            remote,
        }
    }
}
