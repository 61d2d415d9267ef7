//! Synthesis instructions for the two document categories.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — rewording an instruction requires editing
//!    exactly one place.
//! 2. **Testability** — unit tests can inspect the prompt a category maps to
//!    without spinning up a real model.
//!
//! The instructions are Korean because the corpus is Korean-language scanned
//! business documents; the model is asked for a human-readable markdown
//! rendition of the OCR text.

/// System prompt for every synthesis call.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Instruction for operation-instruction (`운용지시서`) pages.
pub const OPERATION_INSTRUCTION_PROMPT: &str =
    "운용지시서를 ocr한 결과야. 해당 내용을 마크다운으로 사람이 읽을 수 있게 정리해줘.";

/// Instruction for contract (`계약서`) chunks.
pub const CONTRACT_PROMPT: &str =
    "위 계약서 내용을 마크다운으로 사람이 읽을 수 있게 정리해줘.";
