// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./linkio.toml` > `~/.config/linkio/linkio.toml`
//! > `/etc/linkio/linkio.toml` with environment variable overrides via the
//! `LINKIO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LinkioConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/linkio/linkio.toml` (system-wide)
/// 3. `~/.config/linkio/linkio.toml` (user XDG config)
/// 4. `./linkio.toml` (local directory)
/// 5. `LINKIO_*` environment variables
pub fn load_config() -> Result<LinkioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LinkioConfig::default()))
        .merge(Toml::file("/etc/linkio/linkio.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("linkio/linkio.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("linkio.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<LinkioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LinkioConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LinkioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LinkioConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that keys containing
/// underscores stay intact: `LINKIO_SESSION_DEFAULT_IDENTITY` must map to
/// `session.default_identity`, not `session.default.identity`.
fn env_provider() -> Env {
    Env::prefixed("LINKIO_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("app_", "app.", 1)
            .replacen("server_", "server.", 1)
            .replacen("session_", "session.", 1)
            .replacen("store_", "store.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_str_applies_overrides() {
        let config = load_config_from_str(
            r#"
            [server]
            port = 8080

            [session]
            default_identity = "main"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.default_identity.as_deref(), Some("main"));
        // Untouched sections keep their defaults.
        assert_eq!(config.store.path, "auth_state");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = load_config_from_str(
            r#"
            [server]
            prot = 8080
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("prot"));
    }

    #[test]
    fn env_vars_override_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "linkio.toml",
                r#"
                [session]
                default_identity = "from-file"
                "#,
            )?;
            jail.set_env("LINKIO_SESSION_DEFAULT_IDENTITY", "from-env");
            let config = load_config().expect("config should load");
            assert_eq!(config.session.default_identity.as_deref(), Some("from-env"));
            Ok(())
        });
    }
}
