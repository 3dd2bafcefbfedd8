//! Shared-room signaling relay: a durable, append-only signal log per
//! room, replayed to every subscriber and fanned out as new messages
//! arrive. The relay never interprets signaling content beyond validating
//! the wire format at the boundary.

pub mod room;
pub mod ws;

pub use room::{RoomCommand, RoomLog, RoomRegistry, StoredSignal};

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7700".to_owned(),
        }
    }
}

pub fn router(registry: RoomRegistry) -> Router {
    Router::new()
        .route("/rooms/{room_id}", get(ws::ws_handler))
        .with_state(registry)
}

/// Bind and serve rooms until the process is stopped.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let registry = RoomRegistry::new();
    let app = router(registry);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("signaling relay listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("relay server failed")
}
