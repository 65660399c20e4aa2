//! Stockpit server binary.
//!
//! Serves the multi-room stock-market game: health endpoints, power and
//! bot catalogues, and the per-room WebSocket channel. Rooms spawn on
//! first join and tear themselves down when the last participant leaves.

use server::{create_app, ServerConfig, ServerState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let state = ServerState::new();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "stockpit listening");

    axum::serve(listener, app).await?;
    Ok(())
}
