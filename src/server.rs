//! HTTP service wrapping the document pipeline.
//!
//! Endpoints:
//! - `POST /process` — multipart upload (`file`, `source_type`); saves the
//!   PDF into the originals directory and runs the pipeline. Category tags
//!   outside the fixed set and filenames not ending in `.pdf` are rejected
//!   with 400 *before* anything is written or any model is invoked.
//! - `GET /results/{filename}` — download a result artifact as markdown.
//! - `GET /` — service banner.
//!
//! Pipeline failures surface as a single generic 500 carrying the
//! underlying error text; no structured error codes are distinguished to
//! the caller. Retries are the caller's responsibility (resubmit the whole
//! document).

use crate::category::Category;
use crate::error::DocSynthError;
use crate::process::DocumentPipeline;
use axum::{
    extract::{Multipart, Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DocumentPipeline>,
}

/// Response body of `POST /process`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub result_file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    detail: String,
}

/// A handler failure: HTTP status plus the error text.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/process", post(process_document))
        .route("/results/:filename", get(get_result))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn serve(addr: SocketAddr, pipeline: Arc<DocumentPipeline>) -> Result<(), DocSynthError> {
    let app = router(AppState { pipeline });
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DocSynthError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!("Document processing API listening on {addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| DocSynthError::Internal(format!("server error: {e}")))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Document Processing API" }))
}

/// `POST /process` — upload a PDF with its category tag and run the
/// pipeline.
async fn process_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<axum::body::Bytes> = None;
    let mut source_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                file_bytes = Some(field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("failed to read upload: {e}"))
                })?);
            }
            Some("source_type") => {
                source_type = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("failed to read source_type: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let source_type =
        source_type.ok_or_else(|| ApiError::bad_request("missing 'source_type' field"))?;
    let file_name = file_name.ok_or_else(|| ApiError::bad_request("missing 'file' upload"))?;
    let file_bytes = file_bytes.ok_or_else(|| ApiError::bad_request("missing 'file' upload"))?;

    // All validation happens before any side effect.
    let category = Category::parse(&source_type).map_err(|e| ApiError::bad_request(e.to_string()))?;
    if !file_name.ends_with(".pdf") {
        return Err(ApiError::bad_request("Only PDF files are supported"));
    }
    if !is_plain_file_name(&file_name) {
        return Err(ApiError::bad_request("Invalid file name"));
    }

    let upload_path = state.pipeline.config().original_dir.join(&file_name);
    tokio::fs::write(&upload_path, &file_bytes)
        .await
        .map_err(|e| ApiError::internal(format!("failed to store upload: {e}")))?;

    let output = state
        .pipeline
        .process(&file_name, category)
        .await
        .map_err(|e| {
            error!("Processing failed for '{file_name}': {e}");
            ApiError::internal(format!("Processing failed: {e}"))
        })?;

    let result_file = output
        .artifact_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    Ok(Json(ProcessResponse {
        success: true,
        message: format!("{} 처리가 완료되었습니다.", category.tag()),
        result_file,
    }))
}

/// `GET /results/{filename}` — download a result artifact.
async fn get_result(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, ApiError> {
    if !is_plain_file_name(&filename) {
        return Err(ApiError::bad_request("Invalid file name"));
    }

    let path = state.pipeline.config().results_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    "text/markdown; charset=utf-8".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            bytes,
        )
            .into_response()),
        Err(_) => Err(ApiError::not_found("Result file not found")),
    }
}

/// A file name with no path components — the only names the service
/// accepts for uploads and downloads.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && name != "."
        && name != ".."
        && !name.starts_with("..")
}
