//! Document loading and chunking

mod chunker;
pub mod reader;

pub use chunker::TextChunker;
pub use reader::{AutoReader, DocumentReader, PdfReader, TextReader};
