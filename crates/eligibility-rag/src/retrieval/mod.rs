//! Vector indexing and top-k retrieval

pub mod index;
mod retriever;

pub use index::{cosine_similarity, VectorIndex};
pub use retriever::Retriever;
