//! Table extraction: reconstruct tabular structure as annotated HTML.
//!
//! Two-stage algorithm:
//!
//! 1. **Layout stage** — the layout model scans the full page; every region
//!    labeled `"table"` yields an axis-aligned box in page coordinates.
//!    Zero tables is a valid terminal outcome.
//! 2. **Structure stage** — per table, the page is cropped to the table box
//!    and the structure model recovers (a) an HTML skeleton of the grid and
//!    (b) one box per cell in table-local coordinates. Each cell box is
//!    expanded by [`CELL_PADDING`] pixels on every side, clamped to the
//!    table image bounds, cropped, and OCRed; a zero-area crop
//!    short-circuits to an empty string without invoking OCR. Cell texts
//!    substitute into the skeleton's `<td>` nodes in document order.
//!
//! The positional correspondence between detected cell boxes and `<td>`
//! nodes is a precondition of the structure model's contract. It is
//! validated by count here: a mismatch fails the run rather than silently
//! misplacing text.

use crate::engine::{CellBox, LayoutAnalyzer, StructureRecognizer, TextExtractor};
use crate::error::DocSynthError;
use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Padding added to every side of a cell box before cropping, so glyphs
/// touching the ruled cell border stay inside the crop.
pub const CELL_PADDING: i64 = 2;

/// One reconstructed table: its page-coordinate box and the HTML with cell
/// texts filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMarkup {
    /// `[x1, y1, x2, y2]` in page pixels, clamped to the page.
    pub bbox: [u32; 4],
    pub html: String,
}

/// Extracts annotated table HTML from page images.
pub struct TableExtractor {
    layout: Arc<dyn LayoutAnalyzer>,
    structure: Arc<dyn StructureRecognizer>,
    ocr: Arc<dyn TextExtractor>,
}

impl TableExtractor {
    pub fn new(
        layout: Arc<dyn LayoutAnalyzer>,
        structure: Arc<dyn StructureRecognizer>,
        ocr: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            layout,
            structure,
            ocr,
        }
    }

    /// Extract every table on the page, in detection order.
    ///
    /// `page_index` is only for error context; the image is the rendered
    /// page.
    pub fn extract(
        &self,
        page_index: usize,
        page: &DynamicImage,
    ) -> Result<Vec<TableMarkup>, DocSynthError> {
        let engine_err = |detail: String| DocSynthError::ExtractionFailed {
            page: page_index,
            detail,
        };

        let regions = self
            .layout
            .detect(page)
            .map_err(|e| engine_err(format!("layout detection: {e}")))?;

        let mut tables = Vec::new();
        for region in regions.into_iter().filter(|r| r.label == "table") {
            let Some(bbox) = clamp_region(&region.bbox, page.width(), page.height()) else {
                warn!(
                    "Page {}: degenerate table region {:?}, skipped",
                    page_index, region.bbox
                );
                continue;
            };
            let [x1, y1, x2, y2] = bbox;
            let table_img = page.crop_imm(x1, y1, x2 - x1, y2 - y1);

            let structure = self
                .structure
                .recognize(&table_img)
                .map_err(|e| engine_err(format!("table structure: {e}")))?;

            let texts = self.recognize_cells(&table_img, &structure.cells);
            let html = merge_cell_texts(&structure.html, &texts)?;

            debug!(
                "Page {}: table at {:?} with {} cells",
                page_index,
                bbox,
                texts.len()
            );
            tables.push(TableMarkup { bbox, html });
        }

        Ok(tables)
    }

    /// OCR every cell crop. A degenerate box yields `""` without OCR; a
    /// per-cell OCR failure degrades to `""` so one unreadable cell does
    /// not lose the rest of the table.
    fn recognize_cells(&self, table_img: &DynamicImage, cells: &[CellBox]) -> Vec<String> {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let Some((x_min, y_min, x_max, y_max)) =
                    clamp_cell(cell, table_img.width(), table_img.height())
                else {
                    return String::new();
                };
                let crop = table_img.crop_imm(x_min, y_min, x_max - x_min, y_max - y_min);
                match self.ocr.extract(&crop) {
                    Ok(outcome) => outcome.text(),
                    Err(e) => {
                        warn!("Cell {}: OCR failed ({e}), recorded as empty", i + 1);
                        String::new()
                    }
                }
            })
            .collect()
    }
}

/// Pad a cell box by [`CELL_PADDING`] and clamp it to the table image.
///
/// Returns `None` for a degenerate (zero-area) result; the invariant
/// `0 <= x_min < x_max <= width` and likewise for y holds for every
/// `Some` value.
pub fn clamp_cell(cell: &CellBox, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let ((x_min, y_min), (x_max, y_max)) = cell.bounds()?;

    let x_min = ((x_min as i64) - CELL_PADDING).max(0) as u32;
    let y_min = ((y_min as i64) - CELL_PADDING).max(0) as u32;
    let x_max = ((x_max as i64) + CELL_PADDING).min(width as i64).max(0) as u32;
    let y_max = ((y_max as i64) + CELL_PADDING).min(height as i64).max(0) as u32;

    if x_min >= x_max || y_min >= y_max {
        return None;
    }
    Some((x_min, y_min, x_max, y_max))
}

/// Clamp a page-coordinate region box to the page; `None` if degenerate.
fn clamp_region(bbox: &[f32; 4], width: u32, height: u32) -> Option<[u32; 4]> {
    let x1 = (bbox[0] as i64).clamp(0, width as i64) as u32;
    let y1 = (bbox[1] as i64).clamp(0, height as i64) as u32;
    let x2 = (bbox[2] as i64).clamp(0, width as i64) as u32;
    let y2 = (bbox[3] as i64).clamp(0, height as i64) as u32;
    if x1 >= x2 || y1 >= y2 {
        return None;
    }
    Some([x1, y1, x2, y2])
}

static RE_EMPTY_TD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(<td[^>]*>)(</td>)").unwrap());

/// Substitute recognised cell texts into the skeleton's `<td>` nodes, in
/// document order. The i-th text fills the i-th `<td>`; the counts must
/// match exactly.
pub fn merge_cell_texts(skeleton: &str, texts: &[String]) -> Result<String, DocSynthError> {
    let slots = RE_EMPTY_TD.find_iter(skeleton).count();
    if slots != texts.len() {
        return Err(DocSynthError::TableCellMismatch {
            boxes: texts.len(),
            slots,
        });
    }

    let mut out = String::with_capacity(skeleton.len() + texts.iter().map(String::len).sum::<usize>());
    let mut last = 0;
    for (caps, text) in RE_EMPTY_TD.captures_iter(skeleton).zip(texts) {
        let m = caps.get(0).expect("capture 0 always present");
        out.push_str(&skeleton[last..m.start()]);
        out.push_str(&caps[1]);
        out.push_str(&html_escape::encode_text(text));
        out.push_str(&caps[2]);
        last = m.end();
    }
    out.push_str(&skeleton[last..]);
    Ok(out)
}
