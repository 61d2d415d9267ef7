#![cfg(feature = "server")]

//! Handler-level tests for the document processing API.
//!
//! The router is exercised through `tower::ServiceExt::oneshot` with fake
//! engines behind the pipeline, so no pdfium/tesseract/LLM is needed.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use docsynth::engine::{EngineError, Engines, OcrOutcome, PageRenderer, Synthesizer, TextBlock, TextExtractor};
use docsynth::server::{router, AppState};
use docsynth::{DocumentPipeline, PipelineConfig};
use http_body_util::BodyExt;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

// ── Minimal fakes ────────────────────────────────────────────────────────

struct OnePageRenderer {
    calls: AtomicUsize,
}

impl PageRenderer for OnePageRenderer {
    fn render(&self, _pdf_path: &Path) -> Result<Vec<DynamicImage>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            Rgba([255; 4]),
        ))])
    }
}

struct StaticOcr;

impl TextExtractor for StaticOcr {
    fn extract(&self, _image: &DynamicImage) -> Result<OcrOutcome, EngineError> {
        Ok(OcrOutcome {
            blocks: vec![TextBlock {
                quad: [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
                text: "계약 본문".to_string(),
                confidence: 0.9,
            }],
        })
    }
}

struct EchoSynthesizer;

#[async_trait]
impl Synthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str, _instruction: &str) -> Result<String, EngineError> {
        Ok(format!("# 정리\n\n{text}"))
    }
}

fn test_state(root: &Path) -> (AppState, Arc<OnePageRenderer>) {
    let renderer = Arc::new(OnePageRenderer {
        calls: AtomicUsize::new(0),
    });
    let engines = Engines {
        renderer: renderer.clone(),
        ocr: Arc::new(StaticOcr),
        layout: None,
        structure: None,
        synthesizer: Arc::new(EchoSynthesizer),
    };
    let config = PipelineConfig::builder()
        .data_root(root)
        .build()
        .expect("valid config");
    let pipeline = DocumentPipeline::new(config, engines).expect("pipeline must build");
    (
        AppState {
            pipeline: Arc::new(pipeline),
        },
        renderer,
    )
}

// ── Request helpers ──────────────────────────────────────────────────────

const BOUNDARY: &str = "docsynth-test-boundary";

fn multipart_body(file_name: &str, file_bytes: &[u8], source_type: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"source_type\"\r\n\r\n{source_type}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn process_request(file_name: &str, file_bytes: &[u8], source_type: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(file_name, file_bytes, source_type)))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_returns_service_banner() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());

    let response = router(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Document Processing API");
}

#[tokio::test]
async fn invalid_category_is_rejected_before_any_side_effect() {
    let dir = tempfile::tempdir().unwrap();
    let (state, renderer) = test_state(dir.path());

    let response = router(state)
        .oneshot(process_request("doc.pdf", b"%PDF-1.4\n", "영수증"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    // The upload was never saved.
    assert_eq!(
        std::fs::read_dir(dir.path().join("original")).unwrap().count(),
        0
    );
    assert_eq!(
        std::fs::read_dir(dir.path().join("results")).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn non_pdf_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (state, renderer) = test_state(dir.path());

    let response = router(state)
        .oneshot(process_request("notes.txt", b"plain text", "계약서"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("PDF"));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn traversal_file_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());

    let response = router(state)
        .oneshot(process_request("../../evil.pdf", b"%PDF-1.4\n", "계약서"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn successful_upload_processes_and_names_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());

    let response = router(state)
        .oneshot(process_request("doc.pdf", b"%PDF-1.4\nbody\n", "계약서"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["result_file"], "doc_계약서_결과.md");
    assert!(json["message"].as_str().unwrap().contains("계약서"));

    let artifact = dir.path().join("results").join("doc_계약서_결과.md");
    let markdown = std::fs::read_to_string(artifact).unwrap();
    assert!(markdown.contains("계약 본문"));
}

#[tokio::test]
async fn results_endpoint_serves_and_404s() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    std::fs::write(dir.path().join("results").join("known.md"), "# known\n").unwrap();

    let app = router(state);

    let ok = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/results/known.md")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(ok
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/markdown"));
    let bytes = ok.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"# known\n");

    let missing = app
        .oneshot(
            Request::builder()
                .uri("/results/absent.md")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
