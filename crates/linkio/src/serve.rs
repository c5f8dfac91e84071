// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linkio serve` command implementation.
//!
//! Wires the credential store, protocol backend, renderer, and session
//! coordinator into the gateway server, then runs until interrupted.

use std::sync::Arc;

use tracing::info;

use linkio_config::LinkioConfig;
use linkio_core::LinkioError;
use linkio_core::traits::SocketFactory;
use linkio_core::types::Identity;
use linkio_gateway::{GatewayState, QrSvgRenderer, ServerConfig};
use linkio_session::{CoordinatorConfig, SessionCoordinator};
use linkio_store::FileCredentialStore;

/// Runs the `linkio serve` command.
pub async fn run_serve(config: LinkioConfig) -> Result<(), LinkioError> {
    init_tracing(&config.app.log_level);

    let factory = build_factory()?;
    let store = Arc::new(FileCredentialStore::new(&config.store.path));
    let renderer = Arc::new(QrSvgRenderer::new());

    let coordinator = Arc::new(SessionCoordinator::new(
        store,
        factory,
        renderer,
        CoordinatorConfig {
            greeting: config.session.greeting.clone(),
            auto_reply: config.session.auto_reply,
            client_version: config.session.client_version,
        },
    ));

    let state = GatewayState {
        coordinator,
        default_identity: config.session.default_identity.clone().map(Identity),
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        static_dir: config.server.static_dir.clone(),
    };

    info!(
        host = %server_config.host,
        port = server_config.port,
        store = %config.store.path,
        "starting linkio console"
    );

    tokio::select! {
        result = linkio_gateway::start_server(&server_config, state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            Ok(())
        }
    }
}

#[cfg(feature = "stub")]
fn build_factory() -> Result<Arc<dyn SocketFactory>, LinkioError> {
    info!("using the simulated protocol backend");
    Ok(Arc::new(linkio_stub::StubSocketFactory::new()))
}

#[cfg(not(feature = "stub"))]
fn build_factory() -> Result<Arc<dyn SocketFactory>, LinkioError> {
    Err(LinkioError::Config(
        "no protocol backend compiled in; rebuild with the `stub` feature".into(),
    ))
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linkio={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
