//! Layout detection: locate labeled regions on a full page image.
//!
//! The layout model runs out of process behind a serving endpoint; this
//! module is the client side of that fixed contract. Request:
//! `POST {endpoint}` with `{"image": "<base64 PNG>"}`. Response:
//! `{"regions": [{"label": "table", "bbox": [x1, y1, x2, y2]}, …]}` with
//! boxes in page pixel coordinates.
//!
//! Zero regions — and in particular zero `"table"` regions — is a valid
//! terminal outcome; the pipeline simply proceeds without table markup.

use super::EngineError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

/// A detected page region in page pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegion {
    /// Model label, e.g. `"table"`, `"text"`, `"figure"`.
    pub label: String,
    /// Axis-aligned box `[x1, y1, x2, y2]`.
    pub bbox: [f32; 4],
}

/// Detects labeled layout regions on a page image.
pub trait LayoutAnalyzer: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<LayoutRegion>, EngineError>;
}

#[derive(Serialize)]
struct DetectRequest {
    image: String,
}

#[derive(Deserialize)]
struct DetectResponse {
    regions: Vec<LayoutRegion>,
}

/// Client of a layout-detection serving endpoint.
pub struct HttpLayoutAnalyzer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpLayoutAnalyzer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }
}

impl LayoutAnalyzer for HttpLayoutAnalyzer {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<LayoutRegion>, EngineError> {
        let request = DetectRequest {
            image: encode_png_base64(image)?,
        };
        let response: DetectResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| EngineError::Backend(format!("layout endpoint: {e}")))?
            .error_for_status()
            .map_err(|e| EngineError::Backend(format!("layout endpoint: {e}")))?
            .json()
            .map_err(|e| EngineError::Backend(format!("layout response: {e}")))?;

        debug!("Layout detection returned {} regions", response.regions.len());
        Ok(response.regions)
    }
}

/// PNG-encode an image and wrap it in base64 for a JSON request body.
///
/// PNG over JPEG: lossless compression preserves text crispness, which
/// matters far more than payload size for recognition accuracy.
pub(crate) fn encode_png_base64(img: &DynamicImage) -> Result<String, EngineError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| EngineError::Backend(format!("PNG encoding failed: {e}")))?;
    Ok(STANDARD.encode(&buf))
}
