//! Eclipse panel HTTP server.
//!
//! Loads the city timing dataset and map layers, then serves the panel API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin eclipse-server
//!
//! # Fetch the dataset over HTTP and gate on zoom level instead of scale
//! ECLIPSE_DATASET=https://example.org/city-times.json ECLIPSE_MIN_ZOOM=8 \
//!   cargo run --bin eclipse-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `ECLIPSE_DATE`, `ECLIPSE_DATASET`, `ECLIPSE_MAX_SCALE`, `ECLIPSE_MIN_ZOOM`,
//!   `ECLIPSE_UTC_OFFSET_MINUTES`: see [`PanelConfig::apply_env`]
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use eclipse_panel::config::PanelConfig;
use eclipse_panel::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting eclipse panel server");

    let config = PanelConfig::load()?;
    info!(
        "Event date {}, detail threshold {:?}, dataset {}",
        config.event.date, config.viewport.threshold, config.dataset.source
    );

    let state = AppState::initialize(&config).await?;
    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
