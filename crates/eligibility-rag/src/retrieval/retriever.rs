//! Fixed-question, fixed-k retrieval over a vector index

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::RetrievalResult;

use super::index::VectorIndex;

/// Retrieves the passages most relevant to one fixed question
#[derive(Debug, Clone)]
pub struct Retriever {
    k: usize,
    question: String,
    min_similarity: Option<f32>,
}

impl Retriever {
    pub fn new(k: usize, question: impl Into<String>) -> Self {
        Self {
            k,
            question: question.into(),
            min_similarity: None,
        }
    }

    /// Drop ranked passages that score below `threshold`
    pub fn with_min_similarity(mut self, threshold: Option<f32>) -> Self {
        self.min_similarity = threshold;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Embed the question once and query the index. Errors propagate unchanged.
    ///
    /// Fails with `NoRelevantPassages` when the threshold rejects every
    /// ranked passage.
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<RetrievalResult> {
        let query_vector = embedder.embed(&self.question).await?;
        let mut result = index.query(&query_vector, self.k)?;

        if let Some(threshold) = self.min_similarity {
            let before = result.len();
            result = result.filter_min_similarity(threshold);
            tracing::debug!(
                "Similarity threshold {} kept {}/{} passages",
                threshold,
                result.len(),
                before
            );
            if result.is_empty() {
                return Err(Error::NoRelevantPassages(format!(
                    "none of {} ranked passages scored at least {}",
                    before, threshold
                )));
            }
        }

        tracing::info!(
            "Retrieved {} passages (top score {:.3})",
            result.len(),
            result.passages.first().map(|p| p.similarity).unwrap_or(0.0)
        );
        Ok(result)
    }
}
