// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic code renderer double.

use std::sync::Mutex;

use async_trait::async_trait;

use linkio_core::error::LinkioError;
use linkio_core::traits::CodeRenderer;
use linkio_core::types::CodeImage;

/// Renders a payload into a recognizable fake image so tests can assert the
/// delivered image corresponds to the emitted payload.
pub struct MockRenderer {
    fail: Mutex<bool>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            fail: Mutex::new(false),
        }
    }

    /// Make every subsequent `render` fail.
    pub fn fail_renders(&self) {
        *self.fail.lock().unwrap() = true;
    }

    /// The image `render` produces for `payload`.
    pub fn rendered(payload: &str) -> CodeImage {
        CodeImage {
            mime: "image/svg+xml".to_string(),
            data: format!("rendered:{payload}"),
        }
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeRenderer for MockRenderer {
    async fn render(&self, payload: &str) -> Result<CodeImage, LinkioError> {
        if *self.fail.lock().unwrap() {
            return Err(LinkioError::Render {
                message: "mock render failure".into(),
                source: None,
            });
        }
        Ok(Self::rendered(payload))
    }
}
