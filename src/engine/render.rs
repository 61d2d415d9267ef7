//! Page rendering: rasterise every page of a PDF via pdfium.
//!
//! ## Why a trait?
//!
//! pdfium is a native library with its own binding lifecycle; hiding it
//! behind [`PageRenderer`] keeps the pipeline testable without a pdfium
//! install and keeps the "all pages or nothing" contract in one place.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster rendered at a fixed DPI could
//! produce a five-figure pixel dimension and exhaust memory.
//! `max_pixels` caps the longest edge regardless of physical size, which
//! also lands in the sweet spot for OCR accuracy.

use super::EngineError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Renders a source PDF into one raster image per page, in page order.
///
/// Any failure — unreadable file, corrupt document, a single bad page —
/// fails the whole call: no partial page set is ever returned.
pub trait PageRenderer: Send + Sync {
    fn render(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, EngineError>;
}

/// Production renderer backed by pdfium.
///
/// The pdfium binding is created per call: `pdfium-render` keeps
/// thread-local state internally, and the pipeline invokes this from a
/// blocking-pool thread.
pub struct PdfiumRenderer {
    max_pixels: u32,
}

impl PdfiumRenderer {
    pub fn new(max_pixels: u32) -> Self {
        Self { max_pixels }
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, EngineError> {
        let pdfium = Pdfium::default();

        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| EngineError::Backend(format!("{e:?}")))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let render_config = PdfRenderConfig::new()
            .set_target_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let mut images = Vec::with_capacity(total_pages);
        for idx in 0..total_pages {
            let page = pages
                .get(idx as u16)
                .map_err(|e| EngineError::Backend(format!("page {}: {e:?}", idx + 1)))?;

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| EngineError::Backend(format!("page {}: {e:?}", idx + 1)))?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}
