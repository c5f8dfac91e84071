// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler: the request gateway and subscriber channel in one.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "start_auth", "identity": "bot-1", "method": "scan"}
//! {"type": "start_auth", "method": "pairing", "phone_number": "15551234567"}
//! ```
//!
//! Server -> Client (JSON), the notification vocabulary:
//! ```json
//! {"type": "status", "phase": "connecting", "message": "Scan the code with your phone"}
//! {"type": "scan_code", "image": {"mime": "image/svg+xml", "data": "..."}}
//! {"type": "pairing_code", "code": "ABCD1234"}
//! {"type": "status", "phase": "close", "reason": "loggedOut"}
//! {"type": "error", "message": "..."}
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use linkio_core::error::LinkioError;
use linkio_core::traits::Subscriber;
use linkio_core::types::{AuthMethod, Identity, Notification};

use crate::server::GatewayState;

/// Inbound frame from an operator client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsRequest {
    /// Start (or re-join) an authentication attempt.
    StartAuth {
        #[serde(default)]
        identity: Option<String>,
        method: AuthMethod,
        #[serde(default)]
        phone_number: Option<String>,
    },
}

/// Push channel to one connected operator client.
///
/// The coordinator holds this through the session record; when the browser
/// goes away the channel send fails and the coordinator logs and moves on.
pub struct WsSubscriber {
    id: String,
    tx: mpsc::Sender<Notification>,
}

impl WsSubscriber {
    pub fn new(id: impl Into<String>, tx: mpsc::Sender<Notification>) -> Self {
        Self { id: id.into(), tx }
    }
}

#[async_trait]
impl Subscriber for WsSubscriber {
    fn id(&self) -> &str {
        &self.id
    }

    async fn notify(&self, note: Notification) -> Result<(), LinkioError> {
        self.tx.send(note).await.map_err(|_| LinkioError::Channel {
            message: format!("websocket client {} is gone", self.id),
            source: None,
        })
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual operator connection.
///
/// Spawns a sender task forwarding coordinator notifications to the client,
/// then loops reading request frames. On attach in default-identity mode the
/// client is shown the identity's current phase without any request.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let ws_id = uuid::Uuid::new_v4().to_string();
    tracing::debug!(ws_id, "operator client attached");

    let (tx, mut rx) = mpsc::channel::<Notification>(64);
    let subscriber: Arc<dyn Subscriber> = Arc::new(WsSubscriber::new(ws_id.clone(), tx));

    let sender_task = tokio::spawn(async move {
        while let Some(note) = rx.recv().await {
            let frame = match serde_json::to_string(&note) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize notification");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Read-only projection for a client that refreshed mid-flow.
    if let Some(identity) = &state.default_identity {
        state.coordinator.replay_state(identity, &subscriber).await;
    }

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                let request: WsRequest = match serde_json::from_str(text_str) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(ws_id, error = %e, "invalid websocket frame");
                        let _ = subscriber
                            .notify(Notification::error("Unrecognized request."))
                            .await;
                        continue;
                    }
                };
                handle_request(&state, &subscriber, request).await;
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary and ping frames.
        }
    }

    tracing::debug!(ws_id = subscriber.id(), "operator client detached");
    sender_task.abort();
}

/// Dispatches one parsed request frame.
async fn handle_request(
    state: &GatewayState,
    subscriber: &Arc<dyn Subscriber>,
    request: WsRequest,
) {
    match request {
        WsRequest::StartAuth {
            identity,
            method,
            phone_number,
        } => {
            let identity = match identity
                .map(Identity)
                .or_else(|| state.default_identity.clone())
            {
                Some(identity) => identity,
                None => {
                    let _ = subscriber
                        .notify(Notification::error(
                            "An identity is required when no default is configured.",
                        ))
                        .await;
                    return;
                }
            };

            if method == AuthMethod::Pairing && phone_number.is_none() {
                let _ = subscriber
                    .notify(Notification::error(
                        "A phone number is required for pairing-code authentication.",
                    ))
                    .await;
                return;
            }

            // Setup failures become error frames here; everything after
            // setup flows through the subscriber as notifications.
            if let Err(e) = state
                .coordinator
                .request_authentication(identity, method, phone_number, Arc::clone(subscriber))
                .await
            {
                tracing::error!(error = %e, "authentication setup failed");
                let _ = subscriber
                    .notify(Notification::error(format!(
                        "Failed to start authentication: {e}"
                    )))
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_auth_frame_deserializes_minimal() {
        let frame: WsRequest =
            serde_json::from_str(r#"{"type": "start_auth", "method": "scan"}"#).unwrap();
        let WsRequest::StartAuth {
            identity,
            method,
            phone_number,
        } = frame;
        assert!(identity.is_none());
        assert_eq!(method, AuthMethod::Scan);
        assert!(phone_number.is_none());
    }

    #[test]
    fn start_auth_frame_deserializes_pairing() {
        let frame: WsRequest = serde_json::from_str(
            r#"{"type": "start_auth", "identity": "bot-1", "method": "pairing", "phone_number": "15551234567"}"#,
        )
        .unwrap();
        let WsRequest::StartAuth {
            identity,
            method,
            phone_number,
        } = frame;
        assert_eq!(identity.as_deref(), Some("bot-1"));
        assert_eq!(method, AuthMethod::Pairing);
        assert_eq!(phone_number.as_deref(), Some("15551234567"));
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        assert!(serde_json::from_str::<WsRequest>(r#"{"type": "stop_auth"}"#).is_err());
    }
}
