//! Provider abstractions for the embedding and generation collaborators
//!
//! Backends satisfy the traits by implementing their methods; the pipeline
//! only ever sees `dyn EmbeddingProvider` and `dyn LlmProvider`.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;

#[cfg(test)]
pub(crate) mod test_support;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use openai::OpenAiCompatibleLlm;

use std::sync::Arc;

use crate::config::{ExtractionConfig, LlmBackend};
use crate::error::Result;

/// Build the embedder described by the config
pub fn embedder_from_config(config: &ExtractionConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(OllamaEmbedder::new(&config.embeddings)?))
}

/// Build the generator described by the config
pub fn llm_from_config(config: &ExtractionConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.llm.backend {
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm)?),
        LlmBackend::OpenAiCompatible => {
            if config.llm.resolve_api_key().is_none() {
                tracing::warn!("No API key configured for {}", config.llm.base_url);
            }
            Arc::new(OpenAiCompatibleLlm::new(&config.llm)?)
        }
    };
    Ok(llm)
}
