//! Source-document resolution: locate the PDF and validate it up front.
//!
//! Validating the `%PDF` magic bytes here means an unusable file fails with
//! a meaningful input error before any engine runs, rather than surfacing
//! as a renderer crash several stages later.

use crate::error::DocSynthError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a document file name against the originals directory.
///
/// Absolute paths pass through unchanged; bare names are looked up under
/// `original_dir`. The file must exist, be readable, and start with the
/// `%PDF` magic.
pub fn resolve_document(original_dir: &Path, pdf_filename: &str) -> Result<PathBuf, DocSynthError> {
    let candidate = Path::new(pdf_filename);
    let path = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        original_dir.join(pdf_filename)
    };

    if !path.exists() {
        return Err(DocSynthError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(DocSynthError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocSynthError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DocSynthError::FileNotFound { path });
        }
    }

    debug!("Resolved source PDF: {}", path.display());
    Ok(path)
}

/// File-name stem used for page images and the result artifact.
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}
