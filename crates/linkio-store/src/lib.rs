// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed credential store.
//!
//! Layout: one directory per identity under a configured root, holding a
//! single `creds.json` blob. The blob's content is owned by the protocol
//! layer and treated as opaque JSON here; purge deletes the identity's whole
//! directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use linkio_core::error::LinkioError;
use linkio_core::traits::{CredentialSaver, CredentialStore, LoadedCredentials};
use linkio_core::types::{Credentials, Identity};

const CREDS_FILE: &str = "creds.json";

fn io_err(message: impl Into<String>, source: std::io::Error) -> LinkioError {
    LinkioError::Credential {
        message: message.into(),
        source: Some(Box::new(source)),
    }
}

/// Durable per-identity credential storage rooted at one directory.
pub struct FileCredentialStore {
    root: PathBuf,
}

impl FileCredentialStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn identity_dir(&self, identity: &Identity) -> PathBuf {
        self.root.join(identity.as_str())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self, identity: &Identity) -> Result<LoadedCredentials, LinkioError> {
        let dir = self.identity_dir(identity);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_err(format!("failed to create {}", dir.display()), e))?;

        let path = dir.join(CREDS_FILE);
        let value = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| LinkioError::Credential {
                message: format!("corrupt credential blob at {}", path.display()),
                source: Some(Box::new(e)),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(%identity, "no stored credentials, starting fresh");
                serde_json::json!({})
            }
            Err(e) => return Err(io_err(format!("failed to read {}", path.display()), e)),
        };

        let saver = Arc::new(FileCredentialSaver {
            path,
            state: Mutex::new(value.clone()),
        });
        Ok(LoadedCredentials {
            credentials: Credentials(value),
            saver,
        })
    }

    async fn purge(&self, identity: &Identity) -> Result<(), LinkioError> {
        let dir = self.identity_dir(identity);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!(%identity, "purged credential storage");
                Ok(())
            }
            // Purging an identity that never persisted anything is fine.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(format!("failed to purge {}", dir.display()), e)),
        }
    }
}

/// Writes one identity's live credential state back to its `creds.json`.
pub struct FileCredentialSaver {
    path: PathBuf,
    state: Mutex<serde_json::Value>,
}

impl FileCredentialSaver {
    /// Replaces the in-memory state that the next `save` will persist.
    /// Called by the protocol backend whenever the material changes.
    pub async fn update(&self, value: serde_json::Value) {
        *self.state.lock().await = value;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialSaver for FileCredentialSaver {
    async fn save(&self) -> Result<(), LinkioError> {
        let state = self.state.lock().await;
        let bytes = serde_json::to_vec_pretty(&*state).map_err(|e| LinkioError::Credential {
            message: "failed to serialize credential blob".into(),
            source: Some(Box::new(e)),
        })?;
        drop(state);
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| io_err(format!("failed to write {}", self.path.display()), e))?;
        debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }
}
