//! Embedding collaborator: text in, fixed-length vector out

use async_trait::async_trait;
use crate::error::Result;

/// Maps passage and question text to vectors in one shared space.
///
/// Every embedding in one index must come from the same provider instance;
/// vectors from different models are not comparable.
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (all-minilm, nomic-embed-text)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch; the i-th vector belongs to `texts[i]`.
    ///
    /// Falls back to one `embed` call per text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Short backend name for logs
    fn name(&self) -> &str;
}
