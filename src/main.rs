//! websearch-rs server entry point

use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;
use websearch_rs::{
    config,
    network::HttpClient,
    web::{create_router, AppState},
    Search,
};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load()?;

    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting websearch-rs v{}", websearch_rs::VERSION);

    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    let search = Search::from_settings(&settings, client).await?;

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    let app = create_router(AppState::new(settings, search));

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
