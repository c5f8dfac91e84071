// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protocol socket seam.
//!
//! The factory produces a live connection to the messaging network; the
//! coordinator consumes its event stream and drives `send`/`end`. Connection
//! establishment, encryption, and framing are entirely the factory's
//! concern.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::LinkioError;
use crate::types::{AuthMethod, Credentials, Identity, SocketEvent};

/// Everything the factory needs to open one connection.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub identity: Identity,
    pub credentials: Credentials,
    pub method: AuthMethod,
    /// Country-code-prefixed digit string; present iff `method` is pairing.
    pub phone_number: Option<String>,
    /// Wire client version advertised to the network.
    pub version: [u32; 3],
}

/// A freshly opened connection: the control surface plus its event stream.
///
/// The receiver carries both connection-state and message-stream events in
/// arrival order; the coordinator takes ownership of it and pumps it from a
/// dedicated task.
pub struct SocketHandle {
    pub socket: Arc<dyn ProtocolSocket>,
    pub events: mpsc::Receiver<SocketEvent>,
}

/// Opens protocol connections.
#[async_trait]
pub trait SocketFactory: Send + Sync + 'static {
    async fn open(&self, request: OpenRequest) -> Result<SocketHandle, LinkioError>;
}

/// Control surface of one live connection.
#[async_trait]
pub trait ProtocolSocket: Send + Sync + 'static {
    /// The authenticated protocol identity, present once the link is open.
    fn peer(&self) -> Option<String>;

    /// Sends a text message to `target`.
    async fn send(&self, target: &str, text: &str) -> Result<(), LinkioError>;

    /// Terminates the connection with a human-readable reason.
    ///
    /// A terminated socket may keep emitting events for a short window;
    /// consumers must discard them by identity comparison rather than rely
    /// on this call silencing the stream.
    async fn end(&self, reason: &str) -> Result<(), LinkioError>;
}
