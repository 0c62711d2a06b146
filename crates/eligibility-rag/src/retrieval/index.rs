//! In-memory vector index with exact cosine search

use futures::stream::{self, StreamExt, TryStreamExt};
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{IndexEntry, Passage, RetrievalResult, ScoredPassage};

/// Magnitudes below this are treated as zero vectors
const EPSILON: f32 = 1e-12;

/// Cosine similarity of two equal-length vectors. Zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denominator = (mag_a * mag_b).sqrt();
    if denominator < EPSILON || !denominator.is_finite() {
        return 0.0;
    }

    let similarity = (dot / denominator).clamp(-1.0, 1.0);
    if similarity.is_nan() {
        0.0
    } else {
        similarity
    }
}

/// Append-once store of passage embeddings, read-only after `build`
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: Option<usize>,
}

impl VectorIndex {
    /// Embed every passage and store the (passage, embedding) pairs.
    ///
    /// Up to `concurrency` batches of `batch_size` passages are embedded at
    /// once. Each batch carries its starting offset, so the pairing does not
    /// depend on completion order.
    pub async fn build(
        passages: Vec<Passage>,
        embedder: &dyn EmbeddingProvider,
        batch_size: usize,
        concurrency: usize,
    ) -> Result<Self> {
        if batch_size == 0 || concurrency == 0 {
            return Err(Error::invalid_config(
                "batch_size and concurrency must be at least 1",
            ));
        }

        if passages.is_empty() {
            tracing::warn!("Building an index with no passages");
            return Ok(Self::default());
        }

        let batches: Vec<(usize, Vec<String>)> = passages
            .chunks(batch_size)
            .enumerate()
            .map(|(i, batch)| {
                (
                    i * batch_size,
                    batch.iter().map(|p| p.text.clone()).collect(),
                )
            })
            .collect();

        tracing::debug!(
            "Embedding {} passages in {} batches with {} ({} in flight)",
            passages.len(),
            batches.len(),
            embedder.name(),
            concurrency
        );

        let embedded: Vec<(usize, usize, Vec<Vec<f32>>)> = stream::iter(batches)
            .map(move |(start, texts)| async move {
                let vectors = embedder.embed_batch(&texts).await?;
                Ok::<_, Error>((start, texts.len(), vectors))
            })
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; passages.len()];
        for (start, expected, vectors) in embedded {
            if vectors.len() != expected {
                return Err(Error::embedding(format!(
                    "Embedder returned {} vectors for a batch of {}",
                    vectors.len(),
                    expected
                )));
            }
            for (offset, vector) in vectors.into_iter().enumerate() {
                slots[start + offset] = Some(vector);
            }
        }

        let mut index = Self::default();
        for (passage, slot) in passages.into_iter().zip(slots) {
            let embedding = slot.ok_or_else(|| {
                Error::embedding(format!("No embedding produced for passage {}", passage.index))
            })?;
            index.insert(passage, embedding)?;
        }

        tracing::info!(
            "Indexed {} passages ({} dimensions)",
            index.len(),
            index.dimensions.unwrap_or(0)
        );
        Ok(index)
    }

    /// Append one entry; all embeddings must share one dimension
    fn insert(&mut self, passage: Passage, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::embedding(format!(
                "Empty embedding for passage {}",
                passage.index
            )));
        }

        match self.dimensions {
            Some(expected) if expected != embedding.len() => {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
            Some(_) => {}
            None => self.dimensions = Some(embedding.len()),
        }

        self.entries.push(IndexEntry { passage, embedding });
        Ok(())
    }

    /// Top-k entries by cosine similarity, best first, ties in insertion order
    pub fn query(&self, query_vector: &[f32], k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(Error::invalid_config("k must be at least 1"));
        }
        if self.entries.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if let Some(expected) = self.dimensions {
            if expected != query_vector.len() {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_vector, &entry.embedding)))
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        let passages = scored
            .into_iter()
            .map(|(i, similarity)| ScoredPassage {
                passage: self.entries[i].passage.clone(),
                similarity,
            })
            .collect();

        Ok(RetrievalResult::new(passages))
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared embedding length, if any entry exists
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Embeds "x,y" texts literally; later batches finish first
    struct CoordinateEmbedder;

    #[async_trait]
    impl EmbeddingProvider for CoordinateEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            text.split(',')
                .map(|v| v.trim().parse::<f32>().map_err(|e| Error::embedding(e.to_string())))
                .collect()
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let first: f32 = texts[0].split(',').next().unwrap().parse().unwrap_or(0.0);
            tokio::time::sleep(Duration::from_millis((50.0 - first.min(50.0)) as u64)).await;
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn name(&self) -> &str {
            "coordinates"
        }
    }

    struct ShortBatchEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ShortBatchEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]; texts.len().saturating_sub(1)])
        }

        fn name(&self) -> &str {
            "short"
        }
    }

    fn passage(index: usize, text: &str) -> Passage {
        Passage {
            index,
            page_number: 1,
            text: text.to_string(),
            char_start: 0,
            char_end: text.chars().count(),
        }
    }

    fn passages(texts: &[&str]) -> Vec<Passage> {
        texts.iter().enumerate().map(|(i, t)| passage(i, t)).collect()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[3.0, 4.0], &[6.0, 8.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_build_keeps_pairing_under_concurrency() {
        let texts = ["1,0", "2,0", "3,0", "4,0", "5,0", "6,0", "7,0"];
        let index = VectorIndex::build(passages(&texts), &CoordinateEmbedder, 2, 4)
            .await
            .unwrap();

        assert_eq!(index.len(), 7);
        assert_eq!(index.dimensions(), Some(2));
        for (i, entry) in index.entries().iter().enumerate() {
            assert_eq!(entry.passage.index, i);
            assert_eq!(entry.embedding[0], (i + 1) as f32);
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let texts = ["0,1", "1,0", "1,1", "-1,0"];
        let index = VectorIndex::build(passages(&texts), &CoordinateEmbedder, 3, 2)
            .await
            .unwrap();

        let result = index.query(&[1.0, 0.0], 3).unwrap();
        let order: Vec<usize> = result.passages.iter().map(|p| p.passage.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(result.passages[0].similarity > result.passages[1].similarity);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let texts = ["2,0", "1,0", "0,1", "5,0"];
        let index = VectorIndex::build(passages(&texts), &CoordinateEmbedder, 1, 4)
            .await
            .unwrap();

        let result = index.query(&[1.0, 0.0], 10).unwrap();
        let order: Vec<usize> = result.passages.iter().map(|p| p.passage.index).collect();
        assert_eq!(order, vec![0, 1, 3, 2]);
    }

    #[tokio::test]
    async fn test_k_larger_than_index_returns_everything() {
        let texts = ["1,0", "0,1"];
        let index = VectorIndex::build(passages(&texts), &CoordinateEmbedder, 8, 1)
            .await
            .unwrap();
        let result = index.query(&[0.0, 1.0], 50).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.passages[0].similarity >= result.passages[1].similarity);
    }

    #[tokio::test]
    async fn test_query_is_deterministic() {
        let texts = ["1,2", "2,1", "1,1", "3,1", "1,3"];
        let index = VectorIndex::build(passages(&texts), &CoordinateEmbedder, 2, 3)
            .await
            .unwrap();
        assert_eq!(
            index.query(&[1.0, 1.5], 3).unwrap(),
            index.query(&[1.0, 1.5], 3).unwrap()
        );
    }

    #[test]
    fn test_empty_index_query_fails() {
        let index = VectorIndex::default();
        assert!(matches!(index.query(&[1.0], 5), Err(Error::EmptyIndex)));
    }

    #[tokio::test]
    async fn test_zero_k_rejected() {
        let index = VectorIndex::build(passages(&["1,0"]), &CoordinateEmbedder, 1, 1)
            .await
            .unwrap();
        assert!(matches!(index.query(&[1.0, 0.0], 0), Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_mixed_dimensions_rejected() {
        let result = VectorIndex::build(passages(&["1,0", "1,0,0"]), &CoordinateEmbedder, 1, 1).await;
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_query_dimension_checked() {
        let index = VectorIndex::build(passages(&["1,0"]), &CoordinateEmbedder, 1, 1)
            .await
            .unwrap();
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 1),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_short_batch_is_embedding_error() {
        let result = VectorIndex::build(passages(&["a", "b"]), &ShortBatchEmbedder, 2, 1).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_build_with_no_passages() {
        let index = VectorIndex::build(Vec::new(), &ShortBatchEmbedder, 4, 1).await.unwrap();
        assert!(index.is_empty());
    }
}
