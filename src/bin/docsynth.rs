//! CLI binary for docsynth.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and prints the result path.

use anyhow::{Context, Result};
use clap::Parser;
use docsynth::{DocumentPipeline, Engines, PipelineConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process an operation-instruction document
  docsynth --pdf pdf_4_1.pdf --type 운용지시서

  # Process a contract with a custom data root
  docsynth --pdf contract_07.pdf --type 계약서 --data-root /srv/docsynth

  # Enable table extraction (requires the model endpoints)
  docsynth --pdf pdf_5_1.pdf --type 운용지시서 --extract-tables \
      --layout-endpoint http://localhost:9001/layout \
      --structure-endpoint http://localhost:9001/structure

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY               OpenAI API key (auto-detected)
  ANTHROPIC_API_KEY            Anthropic API key (auto-detected)
  DOCSYNTH_LLM_PROVIDER        Override provider (openai, anthropic, ollama, …)
  DOCSYNTH_MODEL               Override model ID
  DOCSYNTH_LAYOUT_ENDPOINT     Layout-detection model endpoint
  DOCSYNTH_STRUCTURE_ENDPOINT  Table-structure model endpoint

The source PDF is looked up in {data-root}/original; rendered pages land in
{data-root}/converted and the result markdown in {data-root}/results as
{stem}_{category}_결과.md.
"#;

/// Process a scanned PDF business document with OCR and LLM synthesis.
#[derive(Parser, Debug)]
#[command(
    name = "docsynth",
    version,
    about = "Convert scanned PDF business documents to structured Markdown",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file name to process (resolved in the originals directory).
    #[arg(long)]
    pdf: String,

    /// Document category: 운용지시서 or 계약서.
    #[arg(long = "type")]
    doc_type: String,

    /// Root of the data directories (original/, converted/, results/).
    #[arg(long, env = "DOCSYNTH_DATA_ROOT", default_value = "./data")]
    data_root: PathBuf,

    /// Maximum chunk length in characters for the contract path.
    #[arg(long, env = "DOCSYNTH_CHUNK_MAX_CHARS", default_value_t = 3000)]
    chunk_max_chars: usize,

    /// OCR language code passed to tesseract.
    #[arg(long, env = "DOCSYNTH_OCR_LANGUAGE", default_value = "kor")]
    ocr_language: String,

    /// Also extract table regions and include their HTML in the page text.
    #[arg(long, env = "DOCSYNTH_EXTRACT_TABLES")]
    extract_tables: bool,

    /// Layout-detection model endpoint (required with --extract-tables).
    #[arg(long, env = "DOCSYNTH_LAYOUT_ENDPOINT")]
    layout_endpoint: Option<String>,

    /// Table-structure model endpoint (required with --extract-tables).
    #[arg(long, env = "DOCSYNTH_STRUCTURE_ENDPOINT")]
    structure_endpoint: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-nano).
    #[arg(long, env = "DOCSYNTH_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, …
    #[arg(long, env = "DOCSYNTH_LLM_PROVIDER")]
    provider: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder = PipelineConfig::builder()
        .data_root(&cli.data_root)
        .chunk_max_chars(cli.chunk_max_chars)
        .ocr_language(cli.ocr_language.clone())
        .extract_tables(cli.extract_tables);

    if let Some(ref url) = cli.layout_endpoint {
        builder = builder.layout_endpoint(url.clone());
    }
    if let Some(ref url) = cli.structure_endpoint {
        builder = builder.structure_endpoint(url.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    let config = builder.build().context("Invalid configuration")?;
    let engines = Engines::from_config(&config).context("Failed to initialise engines")?;
    let pipeline = DocumentPipeline::new(config, engines).context("Failed to set up pipeline")?;

    let output = pipeline
        .process_tagged(&cli.pdf, &cli.doc_type)
        .await
        .context("Processing failed")?;

    println!("{}", output.artifact_path.display());
    if !cli.quiet {
        eprintln!(
            "{} pages, {} chunks, {} tables — {}ms",
            output.stats.page_count,
            output.stats.chunk_count,
            output.stats.table_count,
            output.stats.total_duration_ms
        );
    }

    Ok(())
}
