// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory credential store double with operation counters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use linkio_core::error::LinkioError;
use linkio_core::traits::{CredentialSaver, CredentialStore, LoadedCredentials};
use linkio_core::types::{Credentials, Identity};

#[derive(Default)]
struct StoreState {
    bundles: HashMap<Identity, Credentials>,
    loads: Vec<Identity>,
    purges: Vec<Identity>,
    saves: usize,
}

/// An in-memory credential store recording every load, save, and purge.
#[derive(Default)]
pub struct MemoryCredentialStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities passed to `load`, in call order.
    pub fn loads(&self) -> Vec<Identity> {
        self.state.lock().unwrap().loads.clone()
    }

    /// Identities passed to `purge`, in call order.
    pub fn purges(&self) -> Vec<Identity> {
        self.state.lock().unwrap().purges.clone()
    }

    pub fn purge_count(&self, identity: &Identity) -> usize {
        self.state
            .lock()
            .unwrap()
            .purges
            .iter()
            .filter(|i| *i == identity)
            .count()
    }

    /// Total `save` calls across all handed-out savers.
    pub fn save_count(&self) -> usize {
        self.state.lock().unwrap().saves
    }

    /// Whether a bundle currently exists for `identity`.
    pub fn has_bundle(&self, identity: &Identity) -> bool {
        self.state.lock().unwrap().bundles.contains_key(identity)
    }
}

struct MemorySaver {
    state: Arc<Mutex<StoreState>>,
}

#[async_trait]
impl CredentialSaver for MemorySaver {
    async fn save(&self) -> Result<(), LinkioError> {
        self.state.lock().unwrap().saves += 1;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, identity: &Identity) -> Result<LoadedCredentials, LinkioError> {
        let mut state = self.state.lock().unwrap();
        state.loads.push(identity.clone());
        let credentials = state
            .bundles
            .entry(identity.clone())
            .or_insert_with(|| Credentials(serde_json::json!({})))
            .clone();
        Ok(LoadedCredentials {
            credentials,
            saver: Arc::new(MemorySaver {
                state: Arc::clone(&self.state),
            }),
        })
    }

    async fn purge(&self, identity: &Identity) -> Result<(), LinkioError> {
        let mut state = self.state.lock().unwrap();
        state.purges.push(identity.clone());
        state.bundles.remove(identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_creates_bundle_and_purge_removes_it() {
        let store = MemoryCredentialStore::new();
        let identity = Identity::from("a");

        store.load(&identity).await.unwrap();
        assert!(store.has_bundle(&identity));
        assert_eq!(store.loads(), vec![identity.clone()]);

        store.purge(&identity).await.unwrap();
        assert!(!store.has_bundle(&identity));
        assert_eq!(store.purge_count(&identity), 1);
    }

    #[tokio::test]
    async fn savers_count_into_the_store() {
        let store = MemoryCredentialStore::new();
        let loaded = store.load(&Identity::from("a")).await.unwrap();
        loaded.saver.save().await.unwrap();
        loaded.saver.save().await.unwrap();
        assert_eq!(store.save_count(), 2);
    }
}
