//! Extraction stage: per-page OCR, plus table markup when enabled.
//!
//! Pages are processed strictly in order, one at a time — extraction models
//! are a single shared resource and the pipeline is deliberately
//! sequential. Each page's engine work runs on the blocking pool.
//!
//! A page where OCR finds nothing is recorded with an empty outcome and the
//! run continues; an engine malfunction aborts the run.

use super::render::RenderedPage;
use super::table::{TableExtractor, TableMarkup};
use crate::engine::{OcrOutcome, TextExtractor};
use crate::error::DocSynthError;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything extracted from one page.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    /// 0-based page index.
    pub index: usize,
    /// Page image file name (`{stem}_{index}.png`).
    pub file_name: String,
    /// OCR result; may carry zero blocks.
    pub outcome: OcrOutcome,
    /// Reconstructed table HTML, empty unless table extraction is enabled.
    pub tables: Vec<TableMarkup>,
}

impl PageExtraction {
    /// The page text handed to synthesis: the OCR text, followed by each
    /// table's HTML when present.
    pub fn synthesis_text(&self) -> String {
        let mut text = self.outcome.text();
        for table in &self.tables {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&table.html);
        }
        text
    }

    /// Whether this page produced anything to synthesise.
    pub fn has_content(&self) -> bool {
        self.outcome.has_text() || !self.tables.is_empty()
    }
}

/// Run OCR (and optionally table extraction) over every rendered page.
pub async fn extract_pages(
    ocr: Arc<dyn TextExtractor>,
    tables: Option<Arc<TableExtractor>>,
    pages: &[RenderedPage],
) -> Result<Vec<PageExtraction>, DocSynthError> {
    let mut extractions = Vec::with_capacity(pages.len());

    for page in pages {
        let ocr = Arc::clone(&ocr);
        let tables = tables.clone();
        let image = page.image.clone();
        let index = page.index;

        let (outcome, table_markup) = tokio::task::spawn_blocking(move || {
            let outcome = ocr.extract(&image).map_err(|e| DocSynthError::ExtractionFailed {
                page: index,
                detail: e.to_string(),
            })?;
            let table_markup = match tables {
                Some(extractor) => extractor.extract(index, &image)?,
                None => Vec::new(),
            };
            Ok::<_, DocSynthError>((outcome, table_markup))
        })
        .await
        .map_err(|e| DocSynthError::Internal(format!("Extraction task panicked: {e}")))??;

        debug!(
            "Page {}: {} text blocks, {} tables",
            index,
            outcome.blocks.len(),
            table_markup.len()
        );
        extractions.push(PageExtraction {
            index,
            file_name: page.file_name.clone(),
            outcome,
            tables: table_markup,
        });
    }

    let with_text = extractions.iter().filter(|e| e.outcome.has_text()).count();
    info!(
        "Extracted {}/{} pages with text",
        with_text,
        extractions.len()
    );
    Ok(extractions)
}
