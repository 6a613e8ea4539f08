use crate::{RelayConfig, RelayHub, RelayState, ws_handler, ws_room_handler};
use anyhow::Context;
use axum::Router;
use axum::routing::get;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(hub: RelayHub, config: RelayConfig) -> Router {
    let state = RelayState {
        hub,
        config: Arc::new(config),
    };
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/ws/{room_id}", get(ws_room_handler))
        .with_state(state)
}

/// A relay bound to its listener, not yet serving.
pub struct Relay {
    listener: TcpListener,
    router: Router,
    hub: RelayHub,
}

impl Relay {
    pub async fn bind(config: RelayConfig) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind))?;
        let hub = RelayHub::new(config.queue_capacity);
        Ok(Self {
            listener,
            router: router(hub.clone(), config),
            hub,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn hub(&self) -> RelayHub {
        self.hub.clone()
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Relay listening on {}", self.local_addr()?);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Relay server failed")
    }
}
