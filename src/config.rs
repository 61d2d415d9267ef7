//! Configuration for the document synthesis pipeline.
//!
//! All run behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config between the CLI and the server, log it, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on the
//! documented defaults for the rest.

use crate::error::DocSynthError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a document synthesis run.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use docsynth::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .data_root("./data")
///     .chunk_max_chars(3000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Directory holding the source PDF documents. Default: `./data/original`.
    pub original_dir: PathBuf,

    /// Directory that receives the rendered page PNGs. Default: `./data/converted`.
    ///
    /// Page images are named `{stem}_{index}.png` and are never cleaned up —
    /// the file names double as page identifiers in the result artifact.
    pub converted_dir: PathBuf,

    /// Directory that receives the result artifacts. Default: `./data/results`.
    pub results_dir: PathBuf,

    /// Maximum rendered page dimension in pixels. Default: 2000.
    ///
    /// Caps the raster size regardless of physical page size so a poster-
    /// sized page cannot exhaust memory; the other dimension scales
    /// proportionally.
    pub max_rendered_pixels: u32,

    /// Maximum chunk length in characters for the contract path. Default: 3000.
    ///
    /// Keeps each synthesis call within the model's input budget. The chunk
    /// overlap is derived from this: `min(500, chunk_max_chars / 4)`.
    pub chunk_max_chars: usize,

    /// Maximum tokens the model may generate per synthesis call. Default: 500.
    pub synthesis_max_tokens: usize,

    /// OCR language passed to the text-extraction engine. Default: `kor`.
    pub ocr_language: String,

    /// Run table extraction during the per-page extraction stage. Default: false.
    ///
    /// Off by default: the original pipeline never wired its table extractor
    /// into the document flow, and that behaviour is preserved. Enabling
    /// this appends each page's reconstructed table HTML to the page text
    /// before synthesis; it requires `layout_endpoint` and
    /// `structure_endpoint` to be configured.
    pub extract_tables: bool,

    /// URL of the layout-detection model endpoint.
    /// Falls back to `DOCSYNTH_LAYOUT_ENDPOINT`.
    pub layout_endpoint: Option<String>,

    /// URL of the table-structure model endpoint.
    /// Falls back to `DOCSYNTH_STRUCTURE_ENDPOINT`.
    pub structure_endpoint: Option<String>,

    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            original_dir: PathBuf::from("./data/original"),
            converted_dir: PathBuf::from("./data/converted"),
            results_dir: PathBuf::from("./data/results"),
            max_rendered_pixels: 2000,
            chunk_max_chars: 3000,
            synthesis_max_tokens: 500,
            ocr_language: "kor".to_string(),
            extract_tables: false,
            layout_endpoint: None,
            structure_endpoint: None,
            model: None,
            provider_name: None,
            provider: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("original_dir", &self.original_dir)
            .field("converted_dir", &self.converted_dir)
            .field("results_dir", &self.results_dir)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("chunk_max_chars", &self.chunk_max_chars)
            .field("synthesis_max_tokens", &self.synthesis_max_tokens)
            .field("ocr_language", &self.ocr_language)
            .field("extract_tables", &self.extract_tables)
            .field("layout_endpoint", &self.layout_endpoint)
            .field("structure_endpoint", &self.structure_endpoint)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set all three data directories under one root:
    /// `{root}/original`, `{root}/converted`, `{root}/results`.
    pub fn data_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.config.original_dir = root.join("original");
        self.config.converted_dir = root.join("converted");
        self.config.results_dir = root.join("results");
        self
    }

    pub fn original_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.original_dir = dir.into();
        self
    }

    pub fn converted_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.converted_dir = dir.into();
        self
    }

    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.results_dir = dir.into();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn chunk_max_chars(mut self, n: usize) -> Self {
        self.config.chunk_max_chars = n;
        self
    }

    pub fn synthesis_max_tokens(mut self, n: usize) -> Self {
        self.config.synthesis_max_tokens = n.max(1);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn extract_tables(mut self, v: bool) -> Self {
        self.config.extract_tables = v;
        self
    }

    pub fn layout_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.layout_endpoint = Some(url.into());
        self
    }

    pub fn structure_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.structure_endpoint = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocSynthError> {
        let c = &self.config;
        if c.chunk_max_chars < 8 {
            return Err(DocSynthError::InvalidConfig(format!(
                "chunk_max_chars must be ≥ 8, got {}",
                c.chunk_max_chars
            )));
        }
        if c.ocr_language.is_empty() {
            return Err(DocSynthError::InvalidConfig(
                "ocr_language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
