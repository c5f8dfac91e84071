// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential store seam.
//!
//! The store owns content and format of the persisted credential material;
//! the coordinator only triggers load, incremental save, and purge.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LinkioError;
use crate::types::{Credentials, Identity};

/// Result of loading one identity's credential bundle.
pub struct LoadedCredentials {
    /// The opaque material handed to the socket factory.
    pub credentials: Credentials,
    /// Handle that persists the current material; invoked on every
    /// credentials-changed event from the socket.
    pub saver: Arc<dyn CredentialSaver>,
}

impl std::fmt::Debug for LoadedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedCredentials")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Durable storage for per-identity credential material.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Loads the bundle for `identity`, creating storage if absent.
    async fn load(&self, identity: &Identity) -> Result<LoadedCredentials, LinkioError>;

    /// Irreversibly deletes all stored material for `identity`.
    async fn purge(&self, identity: &Identity) -> Result<(), LinkioError>;
}

/// Persists the live credential state of one loaded bundle.
#[async_trait]
pub trait CredentialSaver: Send + Sync + 'static {
    /// Writes the current material to durable storage.
    async fn save(&self) -> Result<(), LinkioError>;
}
