//! Integration tests for the document pipeline.
//!
//! Every engine is substituted with a fake, so these tests run without
//! pdfium, tesseract, or an LLM API key — they exercise the pipeline's
//! sequencing, category strategies, and artifact shape end-to-end.

use async_trait::async_trait;
use docsynth::engine::{EngineError, Engines, OcrOutcome, PageRenderer, Synthesizer, TextBlock, TextExtractor};
use docsynth::{Category, DocSynthError, DocumentPipeline, PipelineConfig};
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────

/// Renders a fixed number of blank pages, counting invocations.
struct FakeRenderer {
    pages: usize,
    calls: AtomicUsize,
}

impl FakeRenderer {
    fn new(pages: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            calls: AtomicUsize::new(0),
        })
    }
}

impl PageRenderer for FakeRenderer {
    fn render(&self, _pdf_path: &Path) -> Result<Vec<DynamicImage>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..self.pages)
            .map(|_| DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255; 4]))))
            .collect())
    }
}

/// Always fails, like an unreadable source document.
struct BrokenRenderer;

impl PageRenderer for BrokenRenderer {
    fn render(&self, _pdf_path: &Path) -> Result<Vec<DynamicImage>, EngineError> {
        Err(EngineError::Backend("corrupt cross-reference table".into()))
    }
}

/// Pops one scripted outcome per extraction call (the pipeline is
/// sequential, so call order equals page order).
struct QueueOcr {
    outcomes: Mutex<VecDeque<OcrOutcome>>,
}

impl QueueOcr {
    fn scripted(texts: &[&str]) -> Arc<Self> {
        let outcomes = texts
            .iter()
            .map(|t| {
                if t.is_empty() {
                    OcrOutcome::default()
                } else {
                    OcrOutcome {
                        blocks: vec![TextBlock {
                            quad: [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
                            text: t.to_string(),
                            confidence: 0.93,
                        }],
                    }
                }
            })
            .collect();
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
        })
    }
}

impl TextExtractor for QueueOcr {
    fn extract(&self, _image: &DynamicImage) -> Result<OcrOutcome, EngineError> {
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

/// Records every call and returns a deterministic marker per call.
struct RecordingSynthesizer {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingSynthesizer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    async fn synthesize(&self, text: &str, instruction: &str) -> Result<String, EngineError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((text.to_string(), instruction.to_string()));
        Ok(format!("S{}({text})", calls.len()))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn engines(
    renderer: Arc<dyn PageRenderer>,
    ocr: Arc<dyn TextExtractor>,
    synthesizer: Arc<dyn Synthesizer>,
) -> Engines {
    Engines {
        renderer,
        ocr,
        layout: None,
        structure: None,
        synthesizer,
    }
}

fn pipeline_in(root: &Path, engines: Engines) -> DocumentPipeline {
    let config = PipelineConfig::builder()
        .data_root(root)
        .build()
        .expect("valid config");
    DocumentPipeline::new(config, engines).expect("pipeline must build")
}

/// Drop a minimal "%PDF"-prefixed file into the originals directory.
fn seed_pdf(root: &Path, name: &str) {
    let dir = root.join("original");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), b"%PDF-1.4\nfake body for tests\n").unwrap();
}

// ── Operation-instruction scenarios ──────────────────────────────────────

#[tokio::test]
async fn instruction_document_yields_one_section_per_page() {
    let dir = tempfile::tempdir().unwrap();
    let synth = RecordingSynthesizer::new();
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            FakeRenderer::new(2),
            QueueOcr::scripted(&["AAA", "BBB"]),
            synth.clone(),
        ),
    );
    seed_pdf(dir.path(), "manual.pdf");

    let output = pipeline
        .process("manual.pdf", Category::OperationInstruction)
        .await
        .expect("processing must succeed");

    // Two sections, headed by the page image file names, separated by a
    // rule — one rule after each page, including the last.
    assert_eq!(
        output.markdown,
        "## manual_0.png\n\nS1(AAA)\n\n---\n\n## manual_1.png\n\nS2(BBB)\n\n---\n\n"
    );

    // The artifact is the markdown, at the category-shaped path.
    assert_eq!(
        output.artifact_path,
        dir.path().join("results").join("manual_운용지시서_결과.md")
    );
    let on_disk = std::fs::read_to_string(&output.artifact_path).unwrap();
    assert_eq!(on_disk, output.markdown);

    // One synthesis per page, no chunking across pages.
    let calls = synth.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "AAA");
    assert_eq!(calls[1].0, "BBB");
    assert!(calls[0].1.contains("운용지시서"));

    assert_eq!(output.stats.page_count, 2);
    assert_eq!(output.stats.extracted_pages, 2);
    assert_eq!(output.stats.chunk_count, 2);
}

#[tokio::test]
async fn blank_page_is_recorded_empty_without_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    let synth = RecordingSynthesizer::new();
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            FakeRenderer::new(3),
            QueueOcr::scripted(&["first", "", "third"]),
            synth.clone(),
        ),
    );
    seed_pdf(dir.path(), "gaps.pdf");

    let output = pipeline
        .process("gaps.pdf", Category::OperationInstruction)
        .await
        .unwrap();

    // The blank page keeps its heading but gets no model call.
    assert!(output.markdown.contains("## gaps_1.png\n\n\n\n---\n\n"));
    assert_eq!(synth.calls().len(), 2);
    assert_eq!(output.stats.empty_pages, 1);
    assert_eq!(output.stats.extracted_pages, 2);
}

// ── Contract scenarios ───────────────────────────────────────────────────

#[tokio::test]
async fn long_contract_is_chunked_with_exact_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let synth = RecordingSynthesizer::new();

    // 6998 chars of page text + the trailing page separator = 7000 chars
    // combined, so chunking splits at [0,3000) [2500,5500) [5000,7000).
    let page_text: String = (0..6998)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect();
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            FakeRenderer::new(1),
            QueueOcr::scripted(&[page_text.as_str()]),
            synth.clone(),
        ),
    );
    seed_pdf(dir.path(), "deal.pdf");

    let output = pipeline
        .process("deal.pdf", Category::Contract)
        .await
        .unwrap();

    let calls = synth.calls();
    assert_eq!(calls.len(), 3, "7000 chars at max 3000 must make 3 chunks");
    assert_eq!(output.stats.chunk_count, 3);

    // Chunk lengths per the overlap formula (overlap = min(500, 3000/4)).
    assert_eq!(calls[0].0.chars().count(), 3000);
    assert_eq!(calls[1].0.chars().count(), 3000);
    assert_eq!(calls[2].0.chars().count(), 2000);

    // Consecutive chunks share exactly 500 characters.
    let tail0: String = calls[0].0.chars().skip(2500).collect();
    let head1: String = calls[1].0.chars().take(500).collect();
    assert_eq!(tail0, head1);

    // Every call used the contract instruction.
    assert!(calls.iter().all(|(_, i)| i.contains("계약서")));

    // Assembly is direct concatenation, no separators between chunks.
    assert_eq!(
        output.markdown,
        format!(
            "S1({})S2({})S3({})",
            calls[0].0, calls[1].0, calls[2].0
        )
    );
    assert_eq!(
        output.artifact_path,
        dir.path().join("results").join("deal_계약서_결과.md")
    );
}

#[tokio::test]
async fn short_contract_is_a_single_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    let synth = RecordingSynthesizer::new();
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            FakeRenderer::new(2),
            QueueOcr::scripted(&["제1조", "제2조"]),
            synth.clone(),
        ),
    );
    seed_pdf(dir.path(), "small.pdf");

    let output = pipeline
        .process("small.pdf", Category::Contract)
        .await
        .unwrap();

    // Both pages concatenate (each followed by a blank line) into one chunk.
    let calls = synth.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "제1조\n\n제2조\n\n");
    assert_eq!(output.markdown, format!("S1({})", calls[0].0));
}

#[tokio::test]
async fn unsuccessful_pages_are_skipped_in_contract_concatenation() {
    let dir = tempfile::tempdir().unwrap();
    let synth = RecordingSynthesizer::new();
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            FakeRenderer::new(3),
            QueueOcr::scripted(&["머리말", "", "꼬리말"]),
            synth.clone(),
        ),
    );
    seed_pdf(dir.path(), "holes.pdf");

    pipeline
        .process("holes.pdf", Category::Contract)
        .await
        .unwrap();

    let calls = synth.calls();
    assert_eq!(calls[0].0, "머리말\n\n꼬리말\n\n");
}

// ── Failure scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn unreadable_pdf_surfaces_render_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let synth = RecordingSynthesizer::new();
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            Arc::new(BrokenRenderer),
            QueueOcr::scripted(&[]),
            synth.clone(),
        ),
    );
    seed_pdf(dir.path(), "broken.pdf");

    let err = pipeline
        .process("broken.pdf", Category::Contract)
        .await
        .unwrap_err();

    assert!(matches!(err, DocSynthError::RenderFailed { .. }));
    assert_eq!(
        std::fs::read_dir(dir.path().join("results")).unwrap().count(),
        0,
        "no partial artifact may exist after a failed run"
    );
    assert!(synth.calls().is_empty(), "no model call after render failure");
}

#[tokio::test]
async fn missing_document_fails_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(1);
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            renderer.clone(),
            QueueOcr::scripted(&["x"]),
            RecordingSynthesizer::new(),
        ),
    );

    let err = pipeline
        .process("absent.pdf", Category::Contract)
        .await
        .unwrap_err();

    assert!(matches!(err, DocSynthError::FileNotFound { .. }));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn synthesis_failure_aborts_without_artifact() {
    struct FailingSynthesizer;

    #[async_trait]
    impl Synthesizer for FailingSynthesizer {
        async fn synthesize(&self, _t: &str, _i: &str) -> Result<String, EngineError> {
            Err(EngineError::Backend("model backend unavailable".into()))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            FakeRenderer::new(1),
            QueueOcr::scripted(&["본문"]),
            Arc::new(FailingSynthesizer),
        ),
    );
    seed_pdf(dir.path(), "doomed.pdf");

    let err = pipeline
        .process("doomed.pdf", Category::Contract)
        .await
        .unwrap_err();

    assert!(matches!(err, DocSynthError::SynthesisFailed { .. }));
    assert_eq!(
        std::fs::read_dir(dir.path().join("results")).unwrap().count(),
        0
    );
}

// ── Category dispatch ────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_category_tag_is_rejected_before_any_side_effect() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(1);
    let synth = RecordingSynthesizer::new();
    let pipeline = pipeline_in(
        dir.path(),
        engines(renderer.clone(), QueueOcr::scripted(&["x"]), synth.clone()),
    );
    seed_pdf(dir.path(), "doc.pdf");

    let err = pipeline.process_tagged("doc.pdf", "영수증").await.unwrap_err();

    assert!(matches!(err, DocSynthError::UnsupportedCategory { .. }));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0, "no render call");
    assert!(synth.calls().is_empty(), "no model call");
    assert_eq!(
        std::fs::read_dir(dir.path().join("results")).unwrap().count(),
        0,
        "no file written"
    );
}

#[tokio::test]
async fn tagged_dispatch_selects_the_category_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let synth = RecordingSynthesizer::new();
    let pipeline = pipeline_in(
        dir.path(),
        engines(
            FakeRenderer::new(2),
            QueueOcr::scripted(&["p1", "p2"]),
            synth.clone(),
        ),
    );
    seed_pdf(dir.path(), "doc.pdf");

    let output = pipeline.process_tagged("doc.pdf", "운용지시서").await.unwrap();

    // Per-page partitioning: two headings, two synthesis calls.
    assert_eq!(output.markdown.matches("## doc_").count(), 2);
    assert_eq!(synth.calls().len(), 2);
}
