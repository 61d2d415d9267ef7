//! Synthesis: turn raw OCR text into human-readable markdown via an LLM.
//!
//! Each call is an independent single-turn completion — no conversation
//! memory across invocations. Decoding is deterministic (temperature 0) and
//! bounded to a fixed output budget, so repeated calls with identical input
//! are expected to produce identical output; residual backend
//! nondeterminism is an accepted external risk, not mitigated here.

use crate::config::PipelineConfig;
use crate::error::DocSynthError;
use crate::prompts::SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

use super::EngineError;

/// Rewrites a text segment as markdown following a task instruction.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, instruction: &str) -> Result<String, EngineError>;
}

/// Production synthesizer over an injected [`LLMProvider`].
pub struct LlmSynthesizer {
    provider: Arc<dyn LLMProvider>,
    max_tokens: usize,
}

impl LlmSynthesizer {
    pub fn new(provider: Arc<dyn LLMProvider>, max_tokens: usize) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }
}

#[async_trait]
impl Synthesizer for LlmSynthesizer {
    async fn synthesize(&self, text: &str, instruction: &str) -> Result<String, EngineError> {
        // The OCR text comes first and the instruction after it, matching
        // the reading order the instruction refers to ("the text above").
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("{text}\n\n{instruction}")),
        ];

        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| EngineError::Backend(format!("{e}")))?;

        debug!(
            "Synthesis: {} prompt tokens, {} completion tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; used as-is. This is how tests
///    substitute fakes at the provider level.
/// 2. **Named provider + model** (`config.provider_name`) — reads the
///    matching API key from the environment via [`ProviderFactory`].
/// 3. **Environment pair** (`DOCSYNTH_LLM_PROVIDER` + `DOCSYNTH_MODEL`) —
///    both set means the execution environment chose; honoured before full
///    auto-detection so the choice wins even with several API keys present.
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — scans the
///    known API key variables and picks the first available provider.
pub fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, DocSynthError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("DOCSYNTH_LLM_PROVIDER"),
        std::env::var("DOCSYNTH_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocSynthError::InvalidConfig(format!(
            "No LLM provider could be auto-detected from environment.\n\
             Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
             Error: {e}"
        )))?;

    Ok(llm_provider)
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DocSynthError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        DocSynthError::InvalidConfig(format!("LLM provider '{name}' is not configured: {e}"))
    })
}
