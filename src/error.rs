//! Error types for the docsynth library.
//!
//! One closed taxonomy, [`DocSynthError`], covers every way a pipeline run
//! can fail. The variants mirror the failure classes of the pipeline stages:
//!
//! * Input errors — the source document cannot be used at all.
//! * [`DocSynthError::RenderFailed`] — rasterisation failed; fatal, the run
//!   aborts with no partial page set accepted downstream.
//! * [`DocSynthError::ExtractionFailed`] — an OCR/layout/structure engine
//!   malfunctioned (missing binary, dead endpoint). Distinct from the
//!   *empty-page* outcome, which is a legitimate result and not an error.
//! * [`DocSynthError::SynthesisFailed`] — the LLM backend failed; fatal to
//!   the current document, never retried automatically.
//!
//! Any stage error unwinds the whole run for that document. The result
//! artifact is written exactly once, at the end, only on full success — so
//! no variant here ever coexists with a partial artifact on disk.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docsynth library.
#[derive(Debug, Error)]
pub enum DocSynthError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source document was not found at the resolved path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Category errors ───────────────────────────────────────────────────
    /// Category tag outside the fixed set. Rejected before any stage runs.
    #[error("Unsupported document category: '{tag}' (expected '운용지시서' or '계약서')")]
    UnsupportedCategory { tag: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The PDF could not be rasterised (corrupt document, renderer failure).
    /// Fatal: no partial page set proceeds to extraction.
    #[error("Failed to render '{path}': {detail}")]
    RenderFailed { path: PathBuf, detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// An extraction engine malfunctioned on a page. A page with no
    /// recognisable text is NOT this error — that is an empty outcome.
    #[error("Extraction failed on page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// The table-structure model returned a different number of cell boxes
    /// than the HTML skeleton has `<td>` slots. Positional substitution
    /// would misplace text, so the run fails instead.
    #[error("Table cell count mismatch: {boxes} detected cell boxes for {slots} <td> slots")]
    TableCellMismatch { boxes: usize, slots: usize },

    // ── Synthesis errors ──────────────────────────────────────────────────
    /// The language-model backend failed. The caller decides whether to
    /// resubmit the whole document; docsynth never retries.
    #[error("Synthesis failed: {detail}")]
    SynthesisFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the result artifact.
    #[error("Failed to write result file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or engine-construction validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
