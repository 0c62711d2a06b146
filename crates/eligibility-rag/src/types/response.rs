//! Retrieval and answer types

use serde::{Deserialize, Serialize};

use super::document::Passage;

/// A passage together with its embedding, owned by the index that built it
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// The indexed passage
    pub passage: Passage,
    /// Embedding of the passage text
    pub embedding: Vec<f32>,
}

/// A retrieved passage with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// The retrieved passage
    pub passage: Passage,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// The passages judged most similar to a query, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub passages: Vec<ScoredPassage>,
}

impl RetrievalResult {
    pub fn new(passages: Vec<ScoredPassage>) -> Self {
        Self { passages }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passage texts in ranked order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.passages.iter().map(|p| p.passage.text.as_str())
    }

    /// Keep only passages scoring at least `threshold`
    pub fn filter_min_similarity(self, threshold: f32) -> Self {
        Self {
            passages: self
                .passages
                .into_iter()
                .filter(|p| p.similarity >= threshold)
                .collect(),
        }
    }
}

/// A generated answer and its cleaned, user-facing form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Text exactly as returned by the generator
    pub raw: String,
    /// Text with reasoning markup removed
    pub cleaned: String,
}
