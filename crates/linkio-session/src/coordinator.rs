// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle coordinator.
//!
//! Drives one identity's connection attempt from request to open or closed:
//! deduplicates concurrent authentication requests, translates protocol
//! events into subscriber notifications, persists credentials incrementally,
//! and purges them on terminal logout.
//!
//! All registry mutation happens under a single lock, and every event
//! handler re-reads the current record and compares attempt ids before
//! acting, so events from a superseded connection can never resurrect a
//! dead session's state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use linkio_core::error::LinkioError;
use linkio_core::traits::{
    CodeRenderer, CredentialStore, OpenRequest, ProtocolSocket, SocketFactory, Subscriber,
};
use linkio_core::types::{
    AuthMethod, ChatMessage, CloseCause, CloseReason, ConnectionPhase, ConnectionUpdate, Identity,
    LinkState, Notification, SocketEvent, StatusPhase,
};

use crate::registry::{CachedCode, SessionRecord, SessionRegistry};

/// Human hints attached to status notifications.
mod hints {
    pub const CONNECTING: &str = "Connecting...";
    pub const GENERATING: &str = "Generating code, please wait...";
    pub const SCAN: &str = "Scan the code with your phone";
    pub const PAIR: &str = "Enter the pairing code on your phone";
    pub const OPEN: &str = "Bot connected";
}

/// Coordinator behavior knobs, resolved from configuration at wiring time.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Self-message sent once after a genuinely new login; `None` disables.
    pub greeting: Option<String>,
    /// Reply to inbound "hello" messages.
    pub auto_reply: bool,
    /// Wire client version passed through to the socket factory.
    pub client_version: [u32; 3],
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            greeting: None,
            auto_reply: true,
            client_version: [2, 3000, 1023223821],
        }
    }
}

/// Outcome of the dedup decision, computed under the registry lock.
enum Admission {
    /// Rule 1: identity already authenticated; reply `open`, create nothing.
    AlreadyOpen,
    /// Rule 2: same subscriber re-issued the same method while an attempt is
    /// in flight; replay the cached code instead of creating a connection.
    Replay(Option<CachedCode>),
    /// Rules 3/4: create a fresh attempt, terminating the superseded
    /// connection if one was still live.
    Create {
        attempt: u64,
        superseded: Option<Arc<dyn ProtocolSocket>>,
    },
}

/// Per-identity session lifecycle coordinator.
///
/// Owns the [`SessionRegistry`] exclusively; collaborators are reached only
/// through their trait seams.
pub struct SessionCoordinator {
    registry: Mutex<SessionRegistry>,
    store: Arc<dyn CredentialStore>,
    factory: Arc<dyn SocketFactory>,
    renderer: Arc<dyn CodeRenderer>,
    config: CoordinatorConfig,
    next_attempt: AtomicU64,
}

impl SessionCoordinator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        factory: Arc<dyn SocketFactory>,
        renderer: Arc<dyn CodeRenderer>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            registry: Mutex::new(SessionRegistry::new()),
            store,
            factory,
            renderer,
            config,
            next_attempt: AtomicU64::new(1),
        }
    }

    /// Starts (or re-joins) an authentication attempt for `identity`.
    ///
    /// Dedup policy, evaluated in order under one registry lock:
    /// 1. already open -> reply `open` to the caller, create nothing;
    /// 2. same subscriber, same method, attempt in flight -> replay the
    ///    cached code (or a generating hint), create nothing;
    /// 3. anything else with an existing record -> terminate the old
    ///    connection (termination failure is logged and swallowed), discard
    ///    the record, and
    /// 4. create a fresh attempt. The placeholder record is inserted before
    ///    the first await, so a racing second request is always caught by
    ///    rule 1 or 2 rather than creating a duplicate connection.
    ///
    /// Setup failures (credential load, socket open) are returned to the
    /// caller after removing the placeholder; converting them into an
    /// `error` notification is the request gateway's job.
    pub async fn request_authentication(
        self: &Arc<Self>,
        identity: Identity,
        method: AuthMethod,
        phone_number: Option<String>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<(), LinkioError> {
        info!(%identity, %method, "authentication requested");

        let admission = self.admit(&identity, method, &subscriber).await;

        let attempt = match admission {
            Admission::AlreadyOpen => {
                debug!(%identity, "session already open, replying without reconnect");
                self.push(&subscriber, Notification::status_with_message(StatusPhase::Open, hints::OPEN))
                    .await;
                return Ok(());
            }
            Admission::Replay(cached) => {
                debug!(%identity, "duplicate request from the same subscriber, replaying state");
                self.replay_code(&subscriber, cached.as_ref()).await;
                return Ok(());
            }
            Admission::Create {
                attempt,
                superseded,
            } => {
                if let Some(old) = superseded {
                    info!(%identity, "terminating superseded connection");
                    if let Err(e) = old.end("superseded by a new authentication request").await {
                        warn!(%identity, error = %e, "failed to end superseded connection");
                    }
                }
                attempt
            }
        };

        // Rule 4: fresh creation. The placeholder is already registered, so
        // failures from here on must clean it up before propagating.
        let loaded = match self.store.load(&identity).await {
            Ok(loaded) => loaded,
            Err(e) => {
                self.discard_placeholder(&identity, attempt).await;
                return Err(e);
            }
        };

        let open_request = OpenRequest {
            identity: identity.clone(),
            credentials: loaded.credentials,
            method,
            phone_number,
            version: self.config.client_version,
        };
        let handle = match self.factory.open(open_request).await {
            Ok(handle) => handle,
            Err(e) => {
                self.discard_placeholder(&identity, attempt).await;
                return Err(e);
            }
        };

        // Attach the connection, unless a racing request superseded the
        // placeholder while setup was pending.
        {
            let mut registry = self.registry.lock().await;
            match registry.get_mut(&identity) {
                Some(record) if record.attempt == attempt => {
                    record.connection = Some(Arc::clone(&handle.socket));
                    record.saver = Some(loaded.saver);
                }
                _ => {
                    drop(registry);
                    debug!(%identity, "attempt superseded during setup, discarding its connection");
                    if let Err(e) = handle.socket.end("superseded during setup").await {
                        warn!(%identity, error = %e, "failed to end orphaned connection");
                    }
                    return Ok(());
                }
            }
        }

        let pump = Arc::clone(self);
        let pump_identity = identity.clone();
        let pump_socket = Arc::clone(&handle.socket);
        let mut events = handle.events;
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                pump.handle_event(&pump_identity, attempt, &pump_socket, event)
                    .await;
            }
            debug!(identity = %pump_identity, attempt, "socket event stream ended");
        });

        self.push(
            &subscriber,
            Notification::status_with_message(StatusPhase::Connecting, hints::CONNECTING),
        )
        .await;
        Ok(())
    }

    /// Read-only projection of the identity's current phase onto a freshly
    /// attached subscriber, including replaying a cached code. Never mutates
    /// the registry and never triggers code generation.
    pub async fn replay_state(&self, identity: &Identity, subscriber: &Arc<dyn Subscriber>) {
        let snapshot = {
            let registry = self.registry.lock().await;
            registry
                .get(identity)
                .map(|record| (record.phase, record.is_open(), record.last_code.clone()))
        };

        match snapshot {
            None => {}
            Some((_, true, _)) | Some((ConnectionPhase::Open, _, _)) => {
                self.push(
                    subscriber,
                    Notification::status_with_message(StatusPhase::Open, hints::OPEN),
                )
                .await;
            }
            Some((ConnectionPhase::Closed, _, _)) => {
                self.push(subscriber, Notification::close(CloseReason::Reconnecting))
                    .await;
            }
            Some((_, _, cached)) => {
                self.replay_code(subscriber, cached.as_ref()).await;
            }
        }
    }

    /// Current phase of an identity's record, if one exists.
    pub async fn session_phase(&self, identity: &Identity) -> Option<ConnectionPhase> {
        self.registry.lock().await.get(identity).map(|r| r.phase)
    }

    /// Number of live records in the registry.
    pub async fn session_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Evaluates the dedup rules and, when a fresh attempt is admitted,
    /// registers its placeholder record in the same critical section.
    async fn admit(
        &self,
        identity: &Identity,
        method: AuthMethod,
        subscriber: &Arc<dyn Subscriber>,
    ) -> Admission {
        let mut registry = self.registry.lock().await;

        if let Some(record) = registry.get(identity) {
            if record.is_open() {
                return Admission::AlreadyOpen;
            }
            // An in-flight attempt (anything not yet closed) absorbs
            // re-issued requests from its own subscriber; a record left by a
            // retryable close means the operator is deliberately retrying.
            let in_flight = record.phase != ConnectionPhase::Closed;
            if in_flight && record.subscriber.id() == subscriber.id() && record.method == method {
                return Admission::Replay(record.last_code.clone());
            }
        }

        let superseded = registry.remove(identity).and_then(|old| old.connection);
        let attempt = self.next_attempt.fetch_add(1, Ordering::Relaxed);
        registry.insert(SessionRecord {
            identity: identity.clone(),
            attempt,
            connection: None,
            subscriber: Arc::clone(subscriber),
            method,
            last_code: None,
            phase: ConnectionPhase::Connecting,
            saver: None,
        });
        Admission::Create {
            attempt,
            superseded,
        }
    }

    /// Removes the placeholder record after a setup failure, but only if it
    /// still belongs to this attempt.
    async fn discard_placeholder(&self, identity: &Identity, attempt: u64) {
        let mut registry = self.registry.lock().await;
        if registry.get(identity).is_some_and(|r| r.attempt == attempt) {
            registry.remove(identity);
        }
    }

    /// Dispatches one socket event for a given attempt.
    async fn handle_event(
        self: &Arc<Self>,
        identity: &Identity,
        attempt: u64,
        socket: &Arc<dyn ProtocolSocket>,
        event: SocketEvent,
    ) {
        match event {
            SocketEvent::Update(update) => {
                self.handle_update(identity, attempt, socket, update).await;
            }
            SocketEvent::CredentialsUpdated => {
                // Staleness guard: a superseded attempt must not overwrite
                // the bundle a fresh attempt is now writing.
                let saver = {
                    let registry = self.registry.lock().await;
                    match registry.get(identity) {
                        Some(record) if record.attempt == attempt => record.saver.clone(),
                        _ => return,
                    }
                };
                if let Some(saver) = saver
                    && let Err(e) = saver.save().await
                {
                    warn!(%identity, error = %e, "failed to persist updated credentials");
                }
            }
            SocketEvent::Message(message) => {
                self.handle_message(identity, attempt, socket, message).await;
            }
        }
    }

    /// Applies one connection-state event.
    ///
    /// Mirrors the protocol's event shape: an update carries either a code
    /// value or a state transition; codes are only surfaced when the update
    /// marks the attempt as a genuinely new login, so a stale replay on a
    /// resumed session never flashes an authentication prompt.
    async fn handle_update(
        self: &Arc<Self>,
        identity: &Identity,
        attempt: u64,
        socket: &Arc<dyn ProtocolSocket>,
        update: ConnectionUpdate,
    ) {
        let Some((subscriber, method)) = self.guard(identity, attempt).await else {
            debug!(%identity, attempt, "discarding event from superseded connection");
            return;
        };

        if update.state != Some(LinkState::Open) && update.new_login {
            if method == AuthMethod::Scan
                && let Some(payload) = update.scan_code.as_deref()
            {
                self.deliver_scan_code(identity, attempt, &subscriber, payload)
                    .await;
                return;
            }
            if method == AuthMethod::Pairing
                && let Some(code) = update.pairing_code.clone()
            {
                self.deliver_pairing_code(identity, attempt, &subscriber, code)
                    .await;
                return;
            }
        }

        match update.state {
            Some(LinkState::Open) => {
                info!(%identity, "connection open");
                {
                    let mut registry = self.registry.lock().await;
                    match registry.get_mut(identity) {
                        Some(record) if record.attempt == attempt => {
                            record.phase = ConnectionPhase::Open;
                            // A later attach must never replay a code from a
                            // finished handshake.
                            record.last_code = None;
                        }
                        _ => return,
                    }
                }
                self.push(
                    &subscriber,
                    Notification::status_with_message(StatusPhase::Open, hints::OPEN),
                )
                .await;

                // Greeting strictly on a genuinely new login; re-sending on
                // every reconnect would spam the account.
                if update.new_login
                    && let Some(greeting) = self.config.greeting.clone()
                {
                    self.send_greeting(identity, socket, &subscriber, &greeting)
                        .await;
                }
            }
            Some(LinkState::Close) => {
                let cause = update.close_cause.unwrap_or(CloseCause::Lost);
                self.handle_close(identity, attempt, &subscriber, cause).await;
            }
            Some(LinkState::Connecting) => {
                {
                    let mut registry = self.registry.lock().await;
                    match registry.get_mut(identity) {
                        Some(record) if record.attempt == attempt => {
                            if record.phase != ConnectionPhase::CodePending {
                                record.phase = ConnectionPhase::Connecting;
                            }
                        }
                        _ => return,
                    }
                }
                self.push(
                    &subscriber,
                    Notification::status_with_message(StatusPhase::Connecting, hints::CONNECTING),
                )
                .await;
            }
            None => {}
        }
    }

    async fn deliver_scan_code(
        &self,
        identity: &Identity,
        attempt: u64,
        subscriber: &Arc<dyn Subscriber>,
        payload: &str,
    ) {
        let image = match self.renderer.render(payload).await {
            Ok(image) => image,
            Err(e) => {
                // Rendering failure aborts this code's delivery but never
                // tears down the connection; it may still open by other means.
                warn!(%identity, error = %e, "failed to render scan code");
                self.push(subscriber, Notification::error("Failed to generate scan code."))
                    .await;
                return;
            }
        };

        {
            let mut registry = self.registry.lock().await;
            match registry.get_mut(identity) {
                Some(record) if record.attempt == attempt => {
                    record.last_code = Some(CachedCode::Scan(image.clone()));
                    record.phase = ConnectionPhase::CodePending;
                }
                // Superseded while rendering: the code belongs to a dead
                // attempt, drop it.
                _ => return,
            }
        }

        debug!(%identity, "scan code delivered");
        self.push(subscriber, Notification::ScanCode { image }).await;
        self.push(
            subscriber,
            Notification::status_with_message(StatusPhase::Connecting, hints::SCAN),
        )
        .await;
    }

    async fn deliver_pairing_code(
        &self,
        identity: &Identity,
        attempt: u64,
        subscriber: &Arc<dyn Subscriber>,
        code: String,
    ) {
        {
            let mut registry = self.registry.lock().await;
            match registry.get_mut(identity) {
                Some(record) if record.attempt == attempt => {
                    record.last_code = Some(CachedCode::Pairing(code.clone()));
                    record.phase = ConnectionPhase::CodePending;
                }
                _ => return,
            }
        }

        debug!(%identity, "pairing code delivered");
        self.push(subscriber, Notification::PairingCode { code }).await;
        self.push(
            subscriber,
            Notification::status_with_message(StatusPhase::Connecting, hints::PAIR),
        )
        .await;
    }

    /// Classifies a close as terminal or retryable and applies the record
    /// lifecycle for each: terminal logout removes the record and purges
    /// credentials; a retryable close keeps the record (still blocking
    /// duplicate attempts) with its connection reference cleared.
    async fn handle_close(
        &self,
        identity: &Identity,
        attempt: u64,
        subscriber: &Arc<dyn Subscriber>,
        cause: CloseCause,
    ) {
        if cause.is_terminal() {
            info!(%identity, "logged out, purging credentials");
            {
                let mut registry = self.registry.lock().await;
                let ours = registry.get(identity).is_some_and(|r| r.attempt == attempt);
                if !ours {
                    return;
                }
                registry.remove(identity);
            }
            self.push(subscriber, Notification::close(CloseReason::LoggedOut))
                .await;
            if let Err(e) = self.store.purge(identity).await {
                warn!(%identity, error = %e, "failed to purge credentials");
            }
        } else {
            info!(%identity, ?cause, "connection closed, awaiting operator retry");
            {
                let mut registry = self.registry.lock().await;
                match registry.get_mut(identity) {
                    Some(record) if record.attempt == attempt => {
                        record.connection = None;
                        record.saver = None;
                        record.phase = ConnectionPhase::Closed;
                    }
                    _ => return,
                }
            }
            self.push(subscriber, Notification::close(CloseReason::Reconnecting))
                .await;
        }
    }

    /// Minimal auto-reply on the message stream.
    async fn handle_message(
        &self,
        identity: &Identity,
        attempt: u64,
        socket: &Arc<dyn ProtocolSocket>,
        message: ChatMessage,
    ) {
        if !self.config.auto_reply {
            return;
        }
        let Some((subscriber, _)) = self.guard(identity, attempt).await else {
            return;
        };
        if message.from_me {
            return;
        }
        let Some(text) = message.text.as_deref() else {
            return;
        };
        if !text.trim().eq_ignore_ascii_case("hello") {
            return;
        }

        let reply = format!("Hi there! I am the linked bot for {identity}.");
        if let Err(e) = socket.send(&message.chat, &reply).await {
            warn!(%identity, error = %e, "failed to send auto-reply");
            self.push(&subscriber, Notification::error("Failed to send reply message."))
                .await;
        }
    }

    async fn send_greeting(
        &self,
        identity: &Identity,
        socket: &Arc<dyn ProtocolSocket>,
        subscriber: &Arc<dyn Subscriber>,
        greeting: &str,
    ) {
        let Some(peer) = socket.peer() else {
            debug!(%identity, "open without peer identity, skipping greeting");
            return;
        };
        if let Err(e) = socket.send(&peer, greeting).await {
            warn!(%identity, error = %e, "failed to send greeting");
            self.push(subscriber, Notification::error("Failed to send greeting message."))
                .await;
        }
    }

    /// Staleness guard: returns the current subscriber and method iff the
    /// identity's record still belongs to `attempt`.
    async fn guard(
        &self,
        identity: &Identity,
        attempt: u64,
    ) -> Option<(Arc<dyn Subscriber>, AuthMethod)> {
        let registry = self.registry.lock().await;
        registry
            .get(identity)
            .filter(|record| record.attempt == attempt)
            .map(|record| (Arc::clone(&record.subscriber), record.method))
    }

    async fn replay_code(&self, subscriber: &Arc<dyn Subscriber>, cached: Option<&CachedCode>) {
        match cached {
            Some(CachedCode::Scan(image)) => {
                self.push(subscriber, Notification::ScanCode { image: image.clone() })
                    .await;
                self.push(
                    subscriber,
                    Notification::status_with_message(StatusPhase::Connecting, hints::SCAN),
                )
                .await;
            }
            Some(CachedCode::Pairing(code)) => {
                self.push(subscriber, Notification::PairingCode { code: code.clone() })
                    .await;
                self.push(
                    subscriber,
                    Notification::status_with_message(StatusPhase::Connecting, hints::PAIR),
                )
                .await;
            }
            None => {
                self.push(
                    subscriber,
                    Notification::status_with_message(StatusPhase::Connecting, hints::GENERATING),
                )
                .await;
            }
        }
    }

    /// Pushes one notification, logging and swallowing delivery failure:
    /// the client may simply have navigated away.
    async fn push(&self, subscriber: &Arc<dyn Subscriber>, note: Notification) {
        if let Err(e) = subscriber.notify(note).await {
            warn!(subscriber = subscriber.id(), error = %e, "notification delivery failed");
        }
    }
}
