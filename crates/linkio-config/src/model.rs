// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Linkio.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Linkio configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkioConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Session coordinator settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Credential store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static operator UI assets.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

/// Session coordinator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Identity used when a request omits one. When set, a freshly attached
    /// client is also shown this identity's current phase.
    #[serde(default)]
    pub default_identity: Option<String>,

    /// Self-message sent once after a genuinely new login. Unset disables
    /// the greeting entirely.
    #[serde(default)]
    pub greeting: Option<String>,

    /// Reply to inbound "hello" messages with a canned acknowledgement.
    #[serde(default = "default_auto_reply")]
    pub auto_reply: bool,

    /// Wire client version triple advertised to the messaging network.
    #[serde(default = "default_client_version")]
    pub client_version: [u32; 3],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_identity: None,
            greeting: None,
            auto_reply: default_auto_reply(),
            client_version: default_client_version(),
        }
    }
}

fn default_auto_reply() -> bool {
    true
}

fn default_client_version() -> [u32; 3] {
    [2, 3000, 1023223821]
}

/// Credential store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Root directory holding one subdirectory of credential material per
    /// identity.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "auth_state".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = LinkioConfig::default();
        assert_eq!(config.app.log_level, "info");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.static_dir, "public");
        assert_eq!(config.store.path, "auth_state");
        assert!(config.session.default_identity.is_none());
        assert!(config.session.greeting.is_none());
        assert!(config.session.auto_reply);
    }
}
