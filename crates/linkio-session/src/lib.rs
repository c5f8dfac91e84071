// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session registry and lifecycle coordinator for Linkio.
//!
//! This crate is the core of Linkio: a per-identity state machine that
//! deduplicates concurrent authentication attempts, bridges asynchronous
//! protocol events into a push-based status stream for exactly the client
//! that initiated them, persists and purges credential material across
//! reconnects and logouts, and classifies every disconnect as retryable or
//! terminal.

pub mod coordinator;
pub mod registry;

pub use coordinator::{CoordinatorConfig, SessionCoordinator};
pub use registry::{CachedCode, SessionRecord, SessionRegistry};
