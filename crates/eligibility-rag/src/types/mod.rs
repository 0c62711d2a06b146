//! Core types for the extraction pipeline

pub mod document;
pub mod response;

pub use document::{Document, FileType, Page, Passage};
pub use response::{Answer, IndexEntry, RetrievalResult, ScoredPassage};
