// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code renderer seam: raw scan payload in, displayable image out.

use async_trait::async_trait;

use crate::error::LinkioError;
use crate::types::CodeImage;

/// Converts a raw scan-code payload into a displayable image payload.
#[async_trait]
pub trait CodeRenderer: Send + Sync + 'static {
    async fn render(&self, payload: &str) -> Result<CodeImage, LinkioError>;
}
