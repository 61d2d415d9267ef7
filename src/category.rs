//! Document categories and their assembly strategies.
//!
//! The original service selected behavior by comparing raw tag strings at
//! every branch point. Here the two recognised categories form a closed enum
//! and each carries its assembly strategy as a pure function from synthesis
//! sections to the artifact string — adding a third category is a
//! compile-time-checked extension, and nothing downstream ever re-inspects a
//! tag string.

use crate::error::DocSynthError;
use crate::prompts;
use serde::{Deserialize, Serialize};

/// The two document categories the pipeline recognises.
///
/// The category determines the extraction granularity (per page vs. whole
/// document), whether chunking applies, the synthesis instruction, and the
/// shape of the assembled artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// `운용지시서` — synthesised page by page, sections separated by a rule.
    OperationInstruction,
    /// `계약서` — pages concatenated, chunked, outputs joined seamlessly.
    Contract,
}

/// One synthesised section of the final artifact.
///
/// For [`Category::OperationInstruction`] the title is the page image file
/// name; for [`Category::Contract`] sections are untitled chunk outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    pub body: String,
}

impl Category {
    /// Parse a category tag. Anything outside the fixed set is rejected here,
    /// before any stage runs or any side effect happens.
    pub fn parse(tag: &str) -> Result<Self, DocSynthError> {
        match tag {
            "운용지시서" => Ok(Category::OperationInstruction),
            "계약서" => Ok(Category::Contract),
            other => Err(DocSynthError::UnsupportedCategory {
                tag: other.to_string(),
            }),
        }
    }

    /// The fixed wire/display tag for this category.
    pub fn tag(&self) -> &'static str {
        match self {
            Category::OperationInstruction => "운용지시서",
            Category::Contract => "계약서",
        }
    }

    /// The synthesis instruction passed to the model for this category.
    pub fn instruction(&self) -> &'static str {
        match self {
            Category::OperationInstruction => prompts::OPERATION_INSTRUCTION_PROMPT,
            Category::Contract => prompts::CONTRACT_PROMPT,
        }
    }

    /// Result artifact file name for a document with the given stem.
    pub fn artifact_name(&self, stem: &str) -> String {
        format!("{stem}_{}_결과.md", self.tag())
    }

    /// Assemble synthesised sections into the final artifact string.
    ///
    /// OperationInstruction: one section per page in page order, headed by
    /// the page image file name and followed by a horizontal rule (after the
    /// last page too). Contract: direct concatenation in chunk order, no
    /// separators — chunk boundaries are invisible in the artifact.
    pub fn assemble(&self, sections: &[Section]) -> String {
        match self {
            Category::OperationInstruction => {
                let mut out = String::new();
                for section in sections {
                    let title = section.title.as_deref().unwrap_or("");
                    out.push_str(&format!("## {title}\n\n"));
                    out.push_str(&section.body);
                    out.push_str("\n\n---\n\n");
                }
                out
            }
            Category::Contract => sections.iter().map(|s| s.body.as_str()).collect(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_tags() {
        assert_eq!(
            Category::parse("운용지시서").unwrap(),
            Category::OperationInstruction
        );
        assert_eq!(Category::parse("계약서").unwrap(), Category::Contract);
    }

    #[test]
    fn parse_rejects_unknown_tag() {
        let err = Category::parse("invoice").unwrap_err();
        assert!(matches!(
            err,
            DocSynthError::UnsupportedCategory { ref tag } if tag == "invoice"
        ));
    }

    #[test]
    fn artifact_name_embeds_tag() {
        assert_eq!(
            Category::OperationInstruction.artifact_name("pdf_4_1"),
            "pdf_4_1_운용지시서_결과.md"
        );
        assert_eq!(
            Category::Contract.artifact_name("deal"),
            "deal_계약서_결과.md"
        );
    }

    #[test]
    fn instruction_assembly_headed_and_ruled() {
        let sections = vec![
            Section {
                title: Some("doc_0.png".into()),
                body: "first".into(),
            },
            Section {
                title: Some("doc_1.png".into()),
                body: "second".into(),
            },
        ];
        let out = Category::OperationInstruction.assemble(&sections);
        assert_eq!(
            out,
            "## doc_0.png\n\nfirst\n\n---\n\n## doc_1.png\n\nsecond\n\n---\n\n"
        );
    }

    #[test]
    fn contract_assembly_is_seamless() {
        let sections = vec![
            Section {
                title: None,
                body: "alpha".into(),
            },
            Section {
                title: None,
                body: "beta".into(),
            },
        ];
        assert_eq!(Category::Contract.assemble(&sections), "alphabeta");
    }
}
