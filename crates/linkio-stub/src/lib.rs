// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted protocol backend for local development.
//!
//! Simulates the remote messaging network's handshake so the whole console
//! can be exercised without a real peer: a code event shortly after open,
//! then a successful login, then a credentials update. `linkio serve` wires
//! this in behind the `stub` feature of the binary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::mpsc;
use tracing::{debug, info};

use linkio_core::error::LinkioError;
use linkio_core::traits::{OpenRequest, ProtocolSocket, SocketFactory, SocketHandle};
use linkio_core::types::{AuthMethod, ConnectionUpdate, LinkState, SocketEvent};

/// Handshake pacing for the simulated network.
#[derive(Debug, Clone, Copy)]
pub struct StubTiming {
    /// Delay before the code event.
    pub code_delay: Duration,
    /// Delay between the code event and the simulated successful login.
    pub open_delay: Duration,
}

impl Default for StubTiming {
    fn default() -> Self {
        Self {
            code_delay: Duration::from_millis(500),
            open_delay: Duration::from_secs(8),
        }
    }
}

/// Factory producing scripted connections.
pub struct StubSocketFactory {
    timing: StubTiming,
}

impl StubSocketFactory {
    pub fn new() -> Self {
        Self {
            timing: StubTiming::default(),
        }
    }

    pub fn with_timing(timing: StubTiming) -> Self {
        Self { timing }
    }
}

impl Default for StubSocketFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketFactory for StubSocketFactory {
    async fn open(&self, request: OpenRequest) -> Result<SocketHandle, LinkioError> {
        info!(
            identity = %request.identity,
            method = %request.method,
            version = ?request.version,
            "opening simulated connection"
        );
        let (tx, rx) = mpsc::channel(32);
        let socket = Arc::new(StubSocket {
            peer: Mutex::new(None),
            ended: AtomicBool::new(false),
        });

        let script_socket = Arc::clone(&socket);
        let timing = self.timing;
        tokio::spawn(async move {
            run_script(script_socket, tx, request, timing).await;
        });

        Ok(SocketHandle { socket, events: rx })
    }
}

/// Plays the scripted handshake, stopping as soon as the connection is ended
/// or its event stream is dropped.
async fn run_script(
    socket: Arc<StubSocket>,
    tx: mpsc::Sender<SocketEvent>,
    request: OpenRequest,
    timing: StubTiming,
) {
    let alive = |socket: &StubSocket| !socket.ended.load(Ordering::SeqCst);

    if tx
        .send(SocketEvent::Update(ConnectionUpdate {
            state: Some(LinkState::Connecting),
            ..Default::default()
        }))
        .await
        .is_err()
    {
        return;
    }

    tokio::time::sleep(timing.code_delay).await;
    if !alive(&socket) {
        return;
    }
    let code_update = match request.method {
        AuthMethod::Scan => ConnectionUpdate {
            scan_code: Some(format!(
                "stub:{}:{}",
                request.identity,
                uuid::Uuid::new_v4()
            )),
            new_login: true,
            ..Default::default()
        },
        AuthMethod::Pairing => ConnectionUpdate {
            pairing_code: Some(pairing_code()),
            new_login: true,
            ..Default::default()
        },
    };
    if tx.send(SocketEvent::Update(code_update)).await.is_err() {
        return;
    }

    // Pretend the operator completed the code step.
    tokio::time::sleep(timing.open_delay).await;
    if !alive(&socket) {
        return;
    }
    *socket.peer.lock().unwrap_or_else(PoisonError::into_inner) =
        Some(format!("{}@stub", request.identity));
    if tx
        .send(SocketEvent::Update(ConnectionUpdate {
            state: Some(LinkState::Open),
            new_login: true,
            ..Default::default()
        }))
        .await
        .is_err()
    {
        return;
    }

    // A real network refreshes credential material right after login.
    let _ = tx.send(SocketEvent::CredentialsUpdated).await;
}

fn pairing_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase()
}

/// A connection whose remote side is a script.
pub struct StubSocket {
    peer: Mutex<Option<String>>,
    ended: AtomicBool,
}

#[async_trait]
impl ProtocolSocket for StubSocket {
    fn peer(&self) -> Option<String> {
        self.peer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), LinkioError> {
        if self.ended.load(Ordering::SeqCst) {
            return Err(LinkioError::socket("connection already ended"));
        }
        info!(target, text, "simulated outbound message");
        Ok(())
    }

    async fn end(&self, reason: &str) -> Result<(), LinkioError> {
        debug!(reason, "simulated connection ended");
        self.ended.store(true, Ordering::SeqCst);
        *self.peer.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkio_core::types::{Credentials, Identity};

    fn request(method: AuthMethod) -> OpenRequest {
        OpenRequest {
            identity: Identity::from("demo"),
            credentials: Credentials::default(),
            method,
            phone_number: (method == AuthMethod::Pairing).then(|| "15551234567".to_string()),
            version: [2, 3000, 1],
        }
    }

    fn fast() -> StubSocketFactory {
        StubSocketFactory::with_timing(StubTiming {
            code_delay: Duration::from_millis(10),
            open_delay: Duration::from_millis(10),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn scan_handshake_orders_connecting_code_open() {
        let mut handle = fast().open(request(AuthMethod::Scan)).await.unwrap();

        let first = handle.events.recv().await.unwrap();
        assert!(matches!(
            first,
            SocketEvent::Update(ConnectionUpdate { state: Some(LinkState::Connecting), .. })
        ));

        let second = handle.events.recv().await.unwrap();
        match second {
            SocketEvent::Update(update) => {
                assert!(update.new_login);
                assert!(update.scan_code.unwrap().starts_with("stub:demo:"));
            }
            other => panic!("expected code update, got {other:?}"),
        }

        let third = handle.events.recv().await.unwrap();
        assert!(matches!(
            third,
            SocketEvent::Update(ConnectionUpdate { state: Some(LinkState::Open), new_login: true, .. })
        ));
        assert_eq!(handle.socket.peer().as_deref(), Some("demo@stub"));

        assert!(matches!(
            handle.events.recv().await.unwrap(),
            SocketEvent::CredentialsUpdated
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn pairing_handshake_emits_a_pairing_code() {
        let mut handle = fast().open(request(AuthMethod::Pairing)).await.unwrap();

        handle.events.recv().await.unwrap(); // connecting
        let code_event = handle.events.recv().await.unwrap();
        match code_event {
            SocketEvent::Update(update) => {
                let code = update.pairing_code.unwrap();
                assert_eq!(code.len(), 8);
                assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
            }
            other => panic!("expected pairing code, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ended_connection_stops_scripting() {
        let mut handle = fast().open(request(AuthMethod::Scan)).await.unwrap();

        handle.events.recv().await.unwrap(); // connecting
        handle.socket.end("superseded").await.unwrap();

        // The script notices the ended flag and never reaches open.
        assert!(handle.events.recv().await.is_none());
        assert!(handle.socket.peer().is_none());
        assert!(handle.socket.send("x", "y").await.is_err());
    }
}
