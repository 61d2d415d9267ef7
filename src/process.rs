//! The document pipeline: orchestrates one run end-to-end.
//!
//! A run is a linear state machine:
//!
//! ```text
//! Rendering → Extracting → Synthesizing → Assembling → Done
//!     │            │             │             │
//!     └────────────┴─────────────┴─────────────┴──▶ Failed
//! ```
//!
//! No state is reachable after Done. Any stage failure aborts the remaining
//! stages; the artifact write is the single side effect of a run and it
//! happens exactly once, at the end, only on full success — the write is
//! atomic (temp file + rename), so a crash mid-write cannot leave a partial
//! artifact either.
//!
//! Execution is fully sequential: one document end-to-end, pages and chunks
//! in order. The engines are loaded once and shared for the process
//! lifetime; concurrent documents would contend for them and must be
//! serialized by the caller.

use crate::category::Category;
use crate::config::PipelineConfig;
use crate::engine::Engines;
use crate::error::DocSynthError;
use crate::output::{ProcessOutput, RunStats};
use crate::pipeline::table::TableExtractor;
use crate::pipeline::{extract, input, render, synthesize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Pipeline stages, in order. Used for log context only — control flow is
/// the sequential code below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Rendering,
    Extracting,
    Synthesizing,
    Assembling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Rendering => "rendering",
            Stage::Extracting => "extracting",
            Stage::Synthesizing => "synthesizing",
            Stage::Assembling => "assembling",
        };
        f.write_str(s)
    }
}

/// The document synthesis pipeline.
///
/// Holds the configuration and the injected engine handles. Construct once
/// and reuse for every document the process handles.
pub struct DocumentPipeline {
    config: PipelineConfig,
    engines: Engines,
    tables: Option<Arc<TableExtractor>>,
}

impl DocumentPipeline {
    /// Create a pipeline, creating the data directories if needed.
    ///
    /// When `config.extract_tables` is set, the engine set must carry layout
    /// and structure handles.
    pub fn new(config: PipelineConfig, engines: Engines) -> Result<Self, DocSynthError> {
        for dir in [
            &config.original_dir,
            &config.converted_dir,
            &config.results_dir,
        ] {
            std::fs::create_dir_all(dir).map_err(|e| DocSynthError::OutputWriteFailed {
                path: dir.clone(),
                source: e,
            })?;
        }

        let tables = if config.extract_tables {
            let (Some(layout), Some(structure)) = (&engines.layout, &engines.structure) else {
                return Err(DocSynthError::InvalidConfig(
                    "table extraction is enabled but the engine set has no \
                     layout/structure handles"
                        .into(),
                ));
            };
            Some(Arc::new(TableExtractor::new(
                Arc::clone(layout),
                Arc::clone(structure),
                Arc::clone(&engines.ocr),
            )))
        } else {
            None
        };

        Ok(Self {
            config,
            engines,
            tables,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one document and write its result artifact.
    ///
    /// `pdf_filename` resolves against the configured originals directory
    /// (absolute paths pass through). On any error, nothing is written.
    pub async fn process(
        &self,
        pdf_filename: &str,
        category: Category,
    ) -> Result<ProcessOutput, DocSynthError> {
        let total_start = Instant::now();
        info!("Processing '{}' as {}", pdf_filename, category);

        // ── Rendering ────────────────────────────────────────────────────
        info!("Stage {}", Stage::Rendering);
        let render_start = Instant::now();
        let pdf_path = input::resolve_document(&self.config.original_dir, pdf_filename)?;
        let stem = input::document_stem(&pdf_path);
        let pages = render::render_pages(
            Arc::clone(&self.engines.renderer),
            &pdf_path,
            &stem,
            &self.config.converted_dir,
        )
        .await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        // ── Extracting ───────────────────────────────────────────────────
        info!("Stage {}", Stage::Extracting);
        let extract_start = Instant::now();
        let extractions =
            extract::extract_pages(Arc::clone(&self.engines.ocr), self.tables.clone(), &pages)
                .await?;
        let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

        // ── Synthesizing ─────────────────────────────────────────────────
        info!("Stage {}", Stage::Synthesizing);
        let synth_start = Instant::now();
        let (sections, chunk_count) = match category {
            Category::OperationInstruction => {
                let sections =
                    synthesize::synthesize_instruction_pages(&self.engines.synthesizer, &extractions)
                        .await?;
                let count = sections.len();
                (sections, count)
            }
            Category::Contract => {
                synthesize::synthesize_contract_chunks(
                    &self.engines.synthesizer,
                    &extractions,
                    self.config.chunk_max_chars,
                )
                .await?
            }
        };
        let synth_duration_ms = synth_start.elapsed().as_millis() as u64;

        // ── Assembling ───────────────────────────────────────────────────
        info!("Stage {}", Stage::Assembling);
        let markdown = category.assemble(&sections);
        let artifact_path = self.config.results_dir.join(category.artifact_name(&stem));
        write_atomic(&artifact_path, &markdown).await?;

        let extracted_pages = extractions.iter().filter(|e| e.outcome.has_text()).count();
        let stats = RunStats {
            page_count: pages.len(),
            extracted_pages,
            empty_pages: pages.len() - extracted_pages,
            table_count: extractions.iter().map(|e| e.tables.len()).sum(),
            chunk_count,
            render_duration_ms,
            extract_duration_ms,
            synth_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Done: {} pages, {} chunks, {}ms total → {}",
            stats.page_count,
            stats.chunk_count,
            stats.total_duration_ms,
            artifact_path.display()
        );

        Ok(ProcessOutput {
            artifact_path,
            markdown,
            stats,
        })
    }

    /// Parse the category tag, then process.
    ///
    /// Unknown tags are rejected here, before any stage runs or any file is
    /// touched.
    pub async fn process_tagged(
        &self,
        pdf_filename: &str,
        category_tag: &str,
    ) -> Result<ProcessOutput, DocSynthError> {
        let category = Category::parse(category_tag)?;
        self.process(pdf_filename, category).await
    }
}

/// Atomic artifact write: temp file in the target directory, then rename.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), DocSynthError> {
    let write_err = |e: std::io::Error| DocSynthError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
