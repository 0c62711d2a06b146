//! Error types for the extraction pipeline

use thiserror::Error;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Extraction pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Bad chunking/retrieval/prompt configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The document reader could not produce a document
    #[error("Failed to read source '{path}': {message}")]
    SourceRead { path: String, message: String },

    /// Retrieval attempted against an index with no entries
    #[error("Vector index is empty; the document produced no passages")]
    EmptyIndex,

    /// Retrieval ranked passages but none can ground the answer
    #[error("No relevant passages: {0}")]
    NoRelevantPassages(String),

    /// Embedding collaborator failure
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Generator collaborator failure
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Generated text failed the shape check
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// Embedding length differs from the rest of the index
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Config file parse error
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a source read error
    pub fn source_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a malformed output error
    pub fn malformed_output(message: impl Into<String>) -> Self {
        Self::MalformedOutput(message.into())
    }

    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "invalid_config",
            Error::SourceRead { .. } => "source_read",
            Error::EmptyIndex => "empty_index",
            Error::NoRelevantPassages(_) => "no_relevant_passages",
            Error::Embedding(_) => "embedding_error",
            Error::Generation(_) => "generation_error",
            Error::MalformedOutput(_) => "malformed_output",
            Error::DimensionMismatch { .. } => "dimension_mismatch",
            Error::Io(_) => "io_error",
            Error::Http(_) => "http_error",
            Error::Toml(_) => "config_parse_error",
        }
    }
}
