//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt-in, text-out generation
///
/// Retries and rate limiting belong to the implementation; the pipeline
/// calls `generate` once.
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
/// - `OpenAiCompatibleLlm`: Groq, OpenAI or any chat-completions endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate free text for a fully assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
