//! Result types for a pipeline run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The outcome of one successful pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Path of the written result artifact.
    pub artifact_path: PathBuf,

    /// The assembled markdown, identical to the artifact contents.
    pub markdown: String,

    /// Run statistics.
    pub stats: RunStats,
}

/// Statistics for a pipeline run.
///
/// Durations are wall-clock per stage; counters describe what each stage
/// actually saw, so two runs of the same document can be diffed from logs
/// alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages rendered from the source PDF.
    pub page_count: usize,
    /// Pages whose extraction produced at least one text block.
    pub extracted_pages: usize,
    /// Pages with no recognisable text (recorded, not an error).
    pub empty_pages: usize,
    /// Table regions reconstructed across all pages (0 unless enabled).
    pub table_count: usize,
    /// Chunks synthesised (contract path; page count for instructions).
    pub chunk_count: usize,
    pub render_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub synth_duration_ms: u64,
    pub total_duration_ms: u64,
}
