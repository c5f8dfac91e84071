// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scan-code rendering for the web UI.
//!
//! Raw scan payloads become base64-encoded SVG images, small enough to push
//! through the WebSocket and displayable with a plain `data:` URI.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use qrcode::QrCode;
use qrcode::render::svg;

use linkio_core::error::LinkioError;
use linkio_core::traits::CodeRenderer;
use linkio_core::types::CodeImage;

const SVG_MIME: &str = "image/svg+xml";

/// Renders scan payloads as QR codes in SVG form.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrSvgRenderer;

impl QrSvgRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CodeRenderer for QrSvgRenderer {
    async fn render(&self, payload: &str) -> Result<CodeImage, LinkioError> {
        let code = QrCode::new(payload.as_bytes()).map_err(|e| LinkioError::Render {
            message: format!("payload not encodable as a QR code: {e}"),
            source: Some(Box::new(e)),
        })?;
        let image = code
            .render::<svg::Color<'_>>()
            .min_dimensions(256, 256)
            .build();
        Ok(CodeImage {
            mime: SVG_MIME.to_string(),
            data: BASE64.encode(image),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_base64_svg() {
        let image = QrSvgRenderer::new().render("linkio-test-payload").await.unwrap();
        assert_eq!(image.mime, "image/svg+xml");
        let decoded = BASE64.decode(image.data.as_bytes()).unwrap();
        let svg_text = String::from_utf8(decoded).unwrap();
        assert!(svg_text.contains("<svg"));
    }

    #[tokio::test]
    async fn distinct_payloads_render_distinct_images() {
        let renderer = QrSvgRenderer::new();
        let a = renderer.render("payload-a").await.unwrap();
        let b = renderer.render("payload-b").await.unwrap();
        assert_ne!(a.data, b.data);
    }
}
