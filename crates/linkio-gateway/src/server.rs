// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Serves the static operator UI and the `/ws` endpoint that carries both
//! authentication requests and status notifications.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use linkio_core::LinkioError;
use linkio_core::types::Identity;
use linkio_session::SessionCoordinator;

use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The session lifecycle coordinator.
    pub coordinator: Arc<SessionCoordinator>,
    /// Identity shown proactively to freshly attached clients, and used for
    /// requests that omit one.
    pub default_identity: Option<Identity>,
}

/// Gateway server configuration (mirrors `ServerConfig` from linkio-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Directory of static operator UI assets.
    pub static_dir: String,
}

/// Start the gateway HTTP/WebSocket server.
///
/// Routes:
/// - GET /ws — operator WebSocket
/// - everything else — static assets from `static_dir`
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), LinkioError> {
    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LinkioError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| LinkioError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkio_session::CoordinatorConfig;
    use linkio_test_utils::{MemoryCredentialStore, MockRenderer, MockSocketFactory};

    #[test]
    fn gateway_state_is_clone() {
        let coordinator = Arc::new(SessionCoordinator::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MockSocketFactory::new()),
            Arc::new(MockRenderer::new()),
            CoordinatorConfig::default(),
        ));
        let state = GatewayState {
            coordinator,
            default_identity: Some(Identity::from("bot-1")),
        };
        let cloned = state.clone();
        assert_eq!(cloned.default_identity, state.default_identity);
    }
}
