// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted protocol socket and factory doubles.
//!
//! Tests script a connection up front, hand it to the factory's queue, then
//! drive the coordinator by pushing events into the connection's stream.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use linkio_core::error::LinkioError;
use linkio_core::traits::{OpenRequest, ProtocolSocket, SocketFactory, SocketHandle};
use linkio_core::types::SocketEvent;

/// A protocol socket that records control calls instead of talking to a
/// network.
pub struct MockSocket {
    peer: Mutex<Option<String>>,
    sent: Mutex<Vec<(String, String)>>,
    ended: Mutex<Vec<String>>,
    fail_send: Mutex<bool>,
    fail_end: Mutex<bool>,
}

impl MockSocket {
    pub fn new() -> Self {
        Self {
            peer: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            ended: Mutex::new(Vec::new()),
            fail_send: Mutex::new(false),
            fail_end: Mutex::new(false),
        }
    }

    /// Mark the socket as authenticated under the given protocol identity.
    pub fn set_peer(&self, peer: impl Into<String>) {
        *self.peer.lock().unwrap() = Some(peer.into());
    }

    /// All `(target, text)` pairs passed to `send`.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// All reasons passed to `end`.
    pub fn end_reasons(&self) -> Vec<String> {
        self.ended.lock().unwrap().clone()
    }

    pub fn end_count(&self) -> usize {
        self.ended.lock().unwrap().len()
    }

    /// Make every subsequent `send` fail.
    pub fn fail_sends(&self) {
        *self.fail_send.lock().unwrap() = true;
    }

    /// Make every subsequent `end` fail.
    pub fn fail_ends(&self) {
        *self.fail_end.lock().unwrap() = true;
    }
}

impl Default for MockSocket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolSocket for MockSocket {
    fn peer(&self) -> Option<String> {
        self.peer.lock().unwrap().clone()
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), LinkioError> {
        if *self.fail_send.lock().unwrap() {
            return Err(LinkioError::socket("mock send failure"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((target.to_string(), text.to_string()));
        Ok(())
    }

    async fn end(&self, reason: &str) -> Result<(), LinkioError> {
        self.ended.lock().unwrap().push(reason.to_string());
        if *self.fail_end.lock().unwrap() {
            return Err(LinkioError::socket("mock end failure"));
        }
        *self.peer.lock().unwrap() = None;
        Ok(())
    }
}

/// One scripted connection: the socket the coordinator will control plus the
/// sender the test uses to emit events on its stream.
pub struct ScriptedConnection {
    pub socket: Arc<MockSocket>,
    pub events: mpsc::Sender<SocketEvent>,
}

/// A factory that hands out pre-scripted connections in order.
///
/// `open` fails when no scripted connection remains, which makes "factory
/// invoked exactly once" assertions reliable.
pub struct MockSocketFactory {
    queue: Mutex<VecDeque<SocketHandle>>,
    opens: Mutex<Vec<OpenRequest>>,
}

impl MockSocketFactory {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            opens: Mutex::new(Vec::new()),
        }
    }

    /// Script the next connection `open` will return.
    pub fn script_connection(&self) -> ScriptedConnection {
        let socket = Arc::new(MockSocket::new());
        let (tx, rx) = mpsc::channel(32);
        self.queue.lock().unwrap().push_back(SocketHandle {
            socket: Arc::clone(&socket) as Arc<dyn ProtocolSocket>,
            events: rx,
        });
        ScriptedConnection { socket, events: tx }
    }

    /// Every request passed to `open`, in call order.
    pub fn open_requests(&self) -> Vec<OpenRequest> {
        self.opens.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.opens.lock().unwrap().len()
    }
}

impl Default for MockSocketFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketFactory for MockSocketFactory {
    async fn open(&self, request: OpenRequest) -> Result<SocketHandle, LinkioError> {
        self.opens.lock().unwrap().push(request);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LinkioError::socket("no scripted connection available"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkio_core::types::{AuthMethod, Credentials, Identity};

    fn request() -> OpenRequest {
        OpenRequest {
            identity: Identity::from("a"),
            credentials: Credentials::default(),
            method: AuthMethod::Scan,
            phone_number: None,
            version: [2, 3000, 1],
        }
    }

    #[tokio::test]
    async fn factory_hands_out_scripted_connections_in_order() {
        let factory = MockSocketFactory::new();
        let first = factory.script_connection();
        first.socket.set_peer("peer-one");

        let handle = factory.open(request()).await.unwrap();
        assert_eq!(handle.socket.peer().as_deref(), Some("peer-one"));
        assert_eq!(factory.open_count(), 1);
    }

    #[tokio::test]
    async fn unscripted_open_fails() {
        let factory = MockSocketFactory::new();
        assert!(factory.open(request()).await.is_err());
    }

    #[tokio::test]
    async fn socket_records_control_calls() {
        let socket = MockSocket::new();
        socket.send("chat", "hi").await.unwrap();
        socket.set_peer("me");
        socket.end("done").await.unwrap();

        assert_eq!(socket.sent(), vec![("chat".to_string(), "hi".to_string())]);
        assert_eq!(socket.end_reasons(), vec!["done".to_string()]);
        assert!(socket.peer().is_none());
    }
}
