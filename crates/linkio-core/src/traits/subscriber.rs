// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscriber seam: a push channel to exactly one operator client.

use async_trait::async_trait;

use crate::error::LinkioError;
use crate::types::Notification;

/// Push channel to the one client that initiated (or is watching) an
/// authentication attempt.
///
/// A session record references exactly one subscriber at a time; a
/// superseding request replaces it, never merges.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Stable id of the client behind this channel, used to detect a
    /// re-issued request from the same client.
    fn id(&self) -> &str;

    /// Delivers one notification. Delivery failure is the caller's to
    /// classify; it never implies the session itself is broken.
    async fn notify(&self, note: Notification) -> Result<(), LinkioError>;
}
