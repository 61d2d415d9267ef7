//! # docsynth
//!
//! Convert scanned PDF business documents into human-readable structured
//! Markdown by chaining OCR and a generative language model.
//!
//! Two fixed document categories are recognised — operation instructions
//! (`운용지시서`) and contracts (`계약서`) — and the category selects the
//! synthesis strategy: instructions are synthesised page by page, contracts
//! are concatenated, split into overlapping chunks bounded by the model's
//! input budget, and synthesised chunk by chunk.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Render      rasterise pages via pdfium, persist page PNGs
//!  ├─ 2. Extract     OCR per page; optionally table regions → cell OCR → HTML
//!  ├─ 3. Chunk       bound long text with overlapping segments (contracts)
//!  ├─ 4. Synthesize  deterministic single-turn LLM calls per page/chunk
//!  └─ 5. Assemble    category-shaped markdown, written atomically once
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsynth::{Category, DocumentPipeline, Engines, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = PipelineConfig::builder().data_root("./data").build()?;
//!     let engines = Engines::from_config(&config)?;
//!     let pipeline = DocumentPipeline::new(config, engines)?;
//!
//!     let output = pipeline.process("pdf_4_1.pdf", Category::Contract).await?;
//!     println!("{}", output.artifact_path.display());
//!     Ok(())
//! }
//! ```
//!
//! The engines (renderer, OCR, layout/table models, LLM) sit behind traits
//! and are injected as one [`Engines`] handle set, loaded once per process;
//! tests substitute fakes without touching pipeline code.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use category::{Category, Section};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use engine::{
    Engines, LayoutAnalyzer, OcrOutcome, PageRenderer, StructureRecognizer, Synthesizer,
    TextBlock, TextExtractor,
};
pub use error::DocSynthError;
pub use output::{ProcessOutput, RunStats};
pub use process::DocumentPipeline;
