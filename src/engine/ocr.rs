//! Text extraction: recognise text lines with boxes and confidence scores.
//!
//! The production backend shells out to the `tesseract` binary in TSV mode.
//! TSV output carries per-word boxes and confidences, which are grouped back
//! into lines here — the pipeline consumes line-level [`TextBlock`]s.
//!
//! A page with zero recognised regions is a legitimate outcome (scanned
//! blank page, separator sheet), not an error: [`OcrOutcome`] simply carries
//! no blocks. Engine malfunction — binary missing, crash, undecodable
//! output — is an [`EngineError`] and fatal to the run.
//!
//! Confidence scores are advisory only. The pipeline accepts all recognised
//! text regardless of score; no thresholding happens anywhere.

use super::EngineError;
use image::DynamicImage;
use std::path::Path;
use std::process::Command;

/// One recognised text line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Corner points of the region, clockwise from top-left.
    pub quad: [[f32; 2]; 4],
    /// The recognised string.
    pub text: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
}

/// The ordered result of extracting one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutcome {
    pub blocks: Vec<TextBlock>,
}

impl OcrOutcome {
    /// Whether any text was recognised. `false` marks the page as an
    /// unsuccessful extraction — recorded, never fatal.
    pub fn has_text(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// All recognised lines joined with `\n`, in reading order.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Extracts text from a raster image.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, image: &DynamicImage) -> Result<OcrOutcome, EngineError>;
}

/// Production extractor shelling out to the `tesseract` binary.
pub struct TesseractExtractor {
    language: String,
}

impl TesseractExtractor {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Probe whether the `tesseract` binary is on PATH.
    pub fn is_available() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run_tesseract(&self, image_path: &Path) -> Result<String, EngineError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .output()
            .map_err(|e| {
                EngineError::Backend(format!(
                    "failed to run tesseract (is it installed?): {e}"
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Backend(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract(&self, image: &DynamicImage) -> Result<OcrOutcome, EngineError> {
        // tesseract wants a file path; stage the image in a temp PNG.
        let tmp = tempfile::Builder::new()
            .prefix("docsynth-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save(tmp.path())
            .map_err(|e| EngineError::Backend(format!("failed to stage image: {e}")))?;

        let tsv = self.run_tesseract(tmp.path())?;
        Ok(parse_tsv(&tsv))
    }
}

/// Parse tesseract TSV output into line-grouped text blocks.
///
/// TSV columns: level page block par line word left top width height conf
/// text. Word rows (level 5) sharing a (block, par, line) key are one line;
/// the line box is the union of its word boxes and the line confidence is
/// the mean word confidence, rescaled from tesseract's 0–100 range.
pub fn parse_tsv(tsv: &str) -> OcrOutcome {
    struct LineAcc {
        key: (u32, u32, u32),
        words: Vec<String>,
        confs: Vec<f32>,
        x_min: f32,
        y_min: f32,
        x_max: f32,
        y_max: f32,
    }

    let mut blocks = Vec::new();
    let mut current: Option<LineAcc> = None;

    let flush = |acc: Option<LineAcc>, blocks: &mut Vec<TextBlock>| {
        if let Some(acc) = acc {
            if acc.words.is_empty() {
                return;
            }
            let conf = acc.confs.iter().sum::<f32>() / acc.confs.len() as f32;
            blocks.push(TextBlock {
                quad: [
                    [acc.x_min, acc.y_min],
                    [acc.x_max, acc.y_min],
                    [acc.x_max, acc.y_max],
                    [acc.x_min, acc.y_max],
                ],
                text: acc.words.join(" "),
                confidence: (conf / 100.0).clamp(0.0, 1.0),
            });
        }
    };

    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        // Only word rows carry text.
        if cols[0] != "5" {
            continue;
        }
        let (Ok(block), Ok(par), Ok(ln)) = (
            cols[2].parse::<u32>(),
            cols[3].parse::<u32>(),
            cols[4].parse::<u32>(),
        ) else {
            continue;
        };
        let (Ok(left), Ok(top), Ok(width), Ok(height)) = (
            cols[6].parse::<f32>(),
            cols[7].parse::<f32>(),
            cols[8].parse::<f32>(),
            cols[9].parse::<f32>(),
        ) else {
            continue;
        };
        let conf = cols[10].parse::<f32>().unwrap_or(0.0);
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        let key = (block, par, ln);
        let start_new = current.as_ref().map(|c| c.key != key).unwrap_or(true);
        if start_new {
            flush(current.take(), &mut blocks);
            current = Some(LineAcc {
                key,
                words: Vec::new(),
                confs: Vec::new(),
                x_min: f32::MAX,
                y_min: f32::MAX,
                x_max: f32::MIN,
                y_max: f32::MIN,
            });
        }
        if let Some(acc) = current.as_mut() {
            acc.words.push(word.to_string());
            acc.confs.push(conf);
            acc.x_min = acc.x_min.min(left);
            acc.y_min = acc.y_min.min(top);
            acc.x_max = acc.x_max.max(left + width);
            acc.y_max = acc.y_max.max(top + height);
        }
    }
    flush(current.take(), &mut blocks);

    OcrOutcome { blocks }
}
