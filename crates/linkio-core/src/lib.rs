// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Linkio session console.
//!
//! This crate provides the shared types, the error type, and the trait
//! seams for every external collaborator of the session coordinator:
//! credential storage, the protocol socket factory, code rendering, and
//! the subscriber push channel.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LinkioError;
pub use traits::{
    CodeRenderer, CredentialSaver, CredentialStore, LoadedCredentials, OpenRequest,
    ProtocolSocket, SocketFactory, SocketHandle, Subscriber,
};
pub use types::{
    AuthMethod, ChatMessage, CloseCause, CloseReason, CodeImage, ConnectionPhase,
    ConnectionUpdate, Credentials, Identity, LinkState, Notification, SocketEvent, StatusPhase,
};
