//! Synthesis stage: drive the model per page or per chunk.
//!
//! This module is intentionally thin glue — the instruction text lives in
//! [`crate::prompts`], the splitting math in [`super::chunk`], and the
//! assembly shape in [`crate::category`] — so the category strategies read
//! as two short drivers:
//!
//! * operation instructions synthesise page by page, no chunking across
//!   pages;
//! * contracts concatenate all successful pages into one logical document,
//!   chunk it, and synthesise chunk by chunk.
//!
//! Calls are sequential and never retried; a backend failure aborts the
//! document.

use super::chunk::chunk_text;
use super::extract::PageExtraction;
use crate::category::{Category, Section};
use crate::engine::Synthesizer;
use crate::error::DocSynthError;
use std::sync::Arc;
use tracing::{debug, info};

/// Synthesise each page of an operation instruction independently.
///
/// Pages whose extraction found nothing are recorded as empty sections —
/// the heading keeps the page visible in the artifact — without a model
/// call.
pub async fn synthesize_instruction_pages(
    synthesizer: &Arc<dyn Synthesizer>,
    pages: &[PageExtraction],
) -> Result<Vec<Section>, DocSynthError> {
    let instruction = Category::OperationInstruction.instruction();
    let mut sections = Vec::with_capacity(pages.len());

    for page in pages {
        let body = if page.has_content() {
            debug!("Synthesizing page {}", page.index);
            synthesize(synthesizer, &page.synthesis_text(), instruction).await?
        } else {
            debug!("Page {} has no text, recorded as empty", page.index);
            String::new()
        };
        sections.push(Section {
            title: Some(page.file_name.clone()),
            body,
        });
    }

    Ok(sections)
}

/// Concatenate, chunk, and synthesise a contract.
///
/// Pages whose extraction was unsuccessful are skipped; every successful
/// page's text is followed by a blank line so page boundaries do not glue
/// words together. Returns the ordered sections plus the chunk count.
pub async fn synthesize_contract_chunks(
    synthesizer: &Arc<dyn Synthesizer>,
    pages: &[PageExtraction],
    chunk_max_chars: usize,
) -> Result<(Vec<Section>, usize), DocSynthError> {
    let mut combined = String::new();
    for page in pages.iter().filter(|p| p.has_content()) {
        combined.push_str(&page.synthesis_text());
        combined.push_str("\n\n");
    }

    let chunks = chunk_text(&combined, chunk_max_chars);
    info!(
        "Contract text: {} chars → {} chunks",
        combined.chars().count(),
        chunks.len()
    );

    let instruction = Category::Contract.instruction();
    let mut sections = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        debug!(
            "Synthesizing chunk {}/{} [{}..{})",
            i + 1,
            chunks.len(),
            chunk.start,
            chunk.end
        );
        let body = synthesize(synthesizer, &chunk.text, instruction).await?;
        sections.push(Section { title: None, body });
    }

    let count = chunks.len();
    Ok((sections, count))
}

async fn synthesize(
    synthesizer: &Arc<dyn Synthesizer>,
    text: &str,
    instruction: &str,
) -> Result<String, DocSynthError> {
    synthesizer
        .synthesize(text, instruction)
        .await
        .map_err(|e| DocSynthError::SynthesisFailed {
            detail: e.to_string(),
        })
}
