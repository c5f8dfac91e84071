// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for deterministic testing.
//!
//! Every seam of the coordinator has a scripted double here: the socket
//! factory hands out pre-built connections whose event streams the test
//! drives by hand, the subscriber captures everything pushed at it, and the
//! credential store counts loads, saves, and purges.

pub mod mock_renderer;
pub mod mock_socket;
pub mod mock_store;
pub mod mock_subscriber;

pub use mock_renderer::MockRenderer;
pub use mock_socket::{MockSocket, MockSocketFactory, ScriptedConnection};
pub use mock_store::MemoryCredentialStore;
pub use mock_subscriber::MockSubscriber;
