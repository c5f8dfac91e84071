// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for every external collaborator of the session coordinator.
//!
//! The coordinator is written entirely against these traits; production
//! wiring and test doubles both live elsewhere.

pub mod credential;
pub mod render;
pub mod socket;
pub mod subscriber;

pub use credential::{CredentialSaver, CredentialStore, LoadedCredentials};
pub use render::CodeRenderer;
pub use socket::{OpenRequest, ProtocolSocket, SocketFactory, SocketHandle};
pub use subscriber::Subscriber;
