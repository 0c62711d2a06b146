//! eligibility-rag: retrieval-augmented extraction of mandatory eligibility
//! criteria from a single RFP document.
//!
//! A run reads the document page by page, splits it into overlapping
//! passages, embeds and indexes them, retrieves the passages closest to a
//! fixed question, prompts a generator with only those passages, strips the
//! model's reasoning trace, and writes the answer to a text file.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::ExtractionConfig;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineState, Stage, StageError};
pub use types::{Answer, Document, Page, Passage, RetrievalResult, ScoredPassage};
