// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory map from identity to session record.
//!
//! Single source of truth for "is this identity already connecting or
//! connected". Only the coordinator mutates it, always under one lock held
//! across each dedup decision, so check-then-act sequences never race.

use std::collections::HashMap;
use std::sync::Arc;

use linkio_core::traits::{CredentialSaver, ProtocolSocket, Subscriber};
use linkio_core::types::{AuthMethod, CodeImage, ConnectionPhase, Identity};

/// The most recently produced code for an attempt, cached so a client that
/// re-attaches mid-flow can be re-shown it without re-triggering generation.
#[derive(Debug, Clone)]
pub enum CachedCode {
    /// Rendered scan-code image.
    Scan(CodeImage),
    /// Raw pairing code.
    Pairing(String),
}

/// Mutable state the coordinator owns for one identity.
pub struct SessionRecord {
    pub identity: Identity,
    /// Monotonic id of the attempt this record belongs to. Event handlers
    /// compare it before acting; a mismatch means the event arrived on a
    /// superseded connection and must be discarded.
    pub attempt: u64,
    /// Live protocol connection, absent while setup is pending or after a
    /// retryable close.
    pub connection: Option<Arc<dyn ProtocolSocket>>,
    /// The one client that initiated or is watching this attempt. Replaced,
    /// never merged, when a new request supersedes it.
    pub subscriber: Arc<dyn Subscriber>,
    pub method: AuthMethod,
    pub last_code: Option<CachedCode>,
    pub phase: ConnectionPhase,
    /// Persists the attempt's credential bundle on credentials-changed
    /// events; attached together with the connection.
    pub saver: Option<Arc<dyn CredentialSaver>>,
}

impl SessionRecord {
    /// True once the connection reports an authenticated protocol identity.
    pub fn is_open(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.peer().is_some())
    }
}

/// Registry of session records, keyed by identity.
///
/// Invariant: at most one record (and therefore at most one non-superseded
/// attempt) per identity.
#[derive(Default)]
pub struct SessionRegistry {
    records: HashMap<Identity, SessionRecord>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &Identity) -> Option<&SessionRecord> {
        self.records.get(identity)
    }

    pub fn get_mut(&mut self, identity: &Identity) -> Option<&mut SessionRecord> {
        self.records.get_mut(identity)
    }

    pub fn insert(&mut self, record: SessionRecord) {
        self.records.insert(record.identity.clone(), record);
    }

    pub fn remove(&mut self, identity: &Identity) -> Option<SessionRecord> {
        self.records.remove(identity)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.records.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
