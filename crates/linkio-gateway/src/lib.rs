// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Linkio operator console.
//!
//! One WebSocket per browser tab carries the whole conversation: inbound
//! `start_auth` request frames and outbound status/code/error notification
//! frames. Static assets and the QR renderer for scan codes live here too,
//! since both exist only for the web UI.

pub mod render;
pub mod server;
pub mod ws;

pub use render::QrSvgRenderer;
pub use server::{GatewayState, ServerConfig, start_server};
pub use ws::WsSubscriber;
