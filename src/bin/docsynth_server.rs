//! HTTP server binary for docsynth.
//!
//! Builds the pipeline once at startup (the engines are the expensive,
//! process-lifetime resources) and serves the document processing API.

use anyhow::{Context, Result};
use clap::Parser;
use docsynth::server;
use docsynth::{DocumentPipeline, Engines, PipelineConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Serve the document processing API.
#[derive(Parser, Debug)]
#[command(
    name = "docsynth-server",
    version,
    about = "HTTP API for processing PDF documents with OCR and LLM"
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "DOCSYNTH_BIND", default_value = "0.0.0.0:8001")]
    bind: SocketAddr,

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

    /// LLM model ID.
    #[arg(long, env = "DOCSYNTH_MODEL")]
    model: Option<String>,

    /// LLM provider name.
    #[arg(long, env = "DOCSYNTH_LLM_PROVIDER")]
    provider: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
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

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    let config = builder.build().context("Invalid configuration")?;
    let engines = Engines::from_config(&config).context("Failed to initialise engines")?;
    let pipeline = DocumentPipeline::new(config, engines).context("Failed to set up pipeline")?;

    server::serve(cli.bind, Arc::new(pipeline))
        .await
        .context("Server failed")?;

    Ok(())
}
