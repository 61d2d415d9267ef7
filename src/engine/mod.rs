//! Model engines: the long-lived inference resources behind the pipeline.
//!
//! The underlying models (renderer, OCR, layout detection, table structure,
//! language model) are expensive to construct and are treated as black-box
//! services with a fixed call contract. Each sits behind a small trait so
//! that:
//!
//! * production wires real backends (pdfium, tesseract, model-serving
//!   endpoints, an LLM provider) exactly once at process start, and
//! * tests substitute fakes without touching any pipeline code.
//!
//! [`Engines`] is the injected handle set — constructed once via
//! [`Engines::from_config`], cloned cheaply (`Arc` per engine), and handed
//! to `DocumentPipeline::new`. There is deliberately no global state and no
//! re-loading: one handle set lives for the lifetime of the process.

pub mod layout;
pub mod ocr;
pub mod render;
pub mod structure;
pub mod synth;

pub use layout::{HttpLayoutAnalyzer, LayoutAnalyzer, LayoutRegion};
pub use ocr::{OcrOutcome, TesseractExtractor, TextBlock, TextExtractor};
pub use render::{PageRenderer, PdfiumRenderer};
pub use structure::{CellBox, HttpStructureRecognizer, StructureRecognizer, TableStructure};
pub use synth::{LlmSynthesizer, Synthesizer};

use crate::config::PipelineConfig;
use crate::error::DocSynthError;
use std::sync::Arc;
use thiserror::Error;

/// Failure of an individual engine call.
///
/// Mapped into the run-level [`DocSynthError`] at stage boundaries, where
/// the page/stage context is known.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backend itself misbehaved (missing binary, dead endpoint,
    /// malformed model output).
    #[error("{0}")]
    Backend(String),

    /// I/O failure while staging data for the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The injected set of engine handles for a pipeline.
#[derive(Clone)]
pub struct Engines {
    pub renderer: Arc<dyn PageRenderer>,
    pub ocr: Arc<dyn TextExtractor>,
    /// Present only when table extraction is configured.
    pub layout: Option<Arc<dyn LayoutAnalyzer>>,
    /// Present only when table extraction is configured.
    pub structure: Option<Arc<dyn StructureRecognizer>>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

impl Engines {
    /// Construct the production engine set from a config.
    ///
    /// The layout and structure handles are only built when
    /// `config.extract_tables` is set; their endpoints then must be present
    /// (config field or `DOCSYNTH_LAYOUT_ENDPOINT` /
    /// `DOCSYNTH_STRUCTURE_ENDPOINT` environment variables).
    pub fn from_config(config: &PipelineConfig) -> Result<Self, DocSynthError> {
        let renderer = Arc::new(PdfiumRenderer::new(config.max_rendered_pixels));
        let ocr = Arc::new(TesseractExtractor::new(&config.ocr_language));

        let (layout, structure) = if config.extract_tables {
            let layout_url = resolve_endpoint(
                config.layout_endpoint.as_deref(),
                "DOCSYNTH_LAYOUT_ENDPOINT",
                "layout",
            )?;
            let structure_url = resolve_endpoint(
                config.structure_endpoint.as_deref(),
                "DOCSYNTH_STRUCTURE_ENDPOINT",
                "table-structure",
            )?;
            (
                Some(Arc::new(HttpLayoutAnalyzer::new(layout_url)) as Arc<dyn LayoutAnalyzer>),
                Some(Arc::new(HttpStructureRecognizer::new(structure_url))
                    as Arc<dyn StructureRecognizer>),
            )
        } else {
            (None, None)
        };

        let provider = synth::resolve_provider(config)?;
        let synthesizer = Arc::new(LlmSynthesizer::new(provider, config.synthesis_max_tokens));

        Ok(Engines {
            renderer,
            ocr,
            layout,
            structure,
            synthesizer,
        })
    }
}

fn resolve_endpoint(
    configured: Option<&str>,
    env_var: &str,
    what: &str,
) -> Result<String, DocSynthError> {
    if let Some(url) = configured {
        return Ok(url.to_string());
    }
    match std::env::var(env_var) {
        Ok(url) if !url.is_empty() => Ok(url),
        _ => Err(DocSynthError::InvalidConfig(format!(
            "table extraction is enabled but no {what} endpoint is configured \
             (set it in the config or via {env_var})"
        ))),
    }
}
