//! Render stage: rasterise the document and persist one PNG per page.
//!
//! The renderer itself lives behind [`PageRenderer`]; this stage drives it
//! on the blocking pool (pdfium is CPU-bound and not async-safe), then
//! writes each page image to the converted directory. The written file name
//! `{stem}_{index}.png` is the page's identity for the rest of the run —
//! operation-instruction output headings carry it verbatim.
//!
//! Rendering is all-or-nothing: any failure aborts the run and no partial
//! page set reaches extraction.

use crate::engine::PageRenderer;
use crate::error::DocSynthError;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// One rendered page, in page order.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 0-based page index within the document.
    pub index: usize,
    /// Page image file name, `{stem}_{index}.png`.
    pub file_name: String,
    /// Full path of the persisted page image.
    pub path: PathBuf,
    /// The in-memory raster, handed on to extraction.
    pub image: DynamicImage,
}

/// Rasterise every page of `pdf_path` and persist the PNGs.
pub async fn render_pages(
    renderer: Arc<dyn PageRenderer>,
    pdf_path: &Path,
    stem: &str,
    converted_dir: &Path,
) -> Result<Vec<RenderedPage>, DocSynthError> {
    let path = pdf_path.to_path_buf();
    let images = tokio::task::spawn_blocking(move || renderer.render(&path))
        .await
        .map_err(|e| DocSynthError::Internal(format!("Render task panicked: {e}")))?
        .map_err(|e| DocSynthError::RenderFailed {
            path: pdf_path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let mut pages = Vec::with_capacity(images.len());
    for (index, image) in images.into_iter().enumerate() {
        let file_name = format!("{stem}_{index}.png");
        let path = converted_dir.join(&file_name);
        image.save(&path).map_err(|e| DocSynthError::RenderFailed {
            path: path.clone(),
            detail: format!("failed to persist page image: {e}"),
        })?;
        pages.push(RenderedPage {
            index,
            file_name,
            path,
            image,
        });
    }

    info!("Rendered {} pages for '{stem}'", pages.len());
    Ok(pages)
}
