//! Pipeline stages for document synthesis.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets an engine
//! implementation change without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ extract ──▶ chunk ──▶ synthesize
//! (path)   (pdfium)   (OCR+tables) (contract  (LLM, per
//!                                   only)      category)
//! ```
//!
//! 1. [`input`]      — resolve the document file name and validate the PDF
//! 2. [`render`]     — rasterise every page and persist the page PNGs; runs
//!    in `spawn_blocking` because pdfium is not async-safe
//! 3. [`extract`]    — per-page OCR, plus table markup when enabled
//! 4. [`table`]      — table region extraction and cell-level OCR merge
//! 5. [`chunk`]      — bound long text to the model's input budget with
//!    overlapping segments (contract path)
//! 6. [`synthesize`] — drive the synthesizer per page or per chunk

pub mod chunk;
pub mod extract;
pub mod input;
pub mod render;
pub mod synthesize;
pub mod table;
