//! Configuration for the extraction pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::generation::{ReasoningMarkers, DEFAULT_QUESTION, DEFAULT_TEMPLATE};

/// Main extraction configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Generator configuration
    pub llm: LlmConfig,
    /// Prompt and post-processing configuration
    pub prompt: PromptConfig,
}

impl ExtractionConfig {
    /// Parse a configuration from TOML text. Missing sections fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every value the pipeline depends on. Runs before any I/O.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.embeddings.validate()?;
        self.prompt.validate()?;
        Ok(())
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window length in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive windows of a page
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::invalid_config("chunk_size must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::invalid_config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of passages handed to the prompt
    pub top_k: usize,
    /// Drop passages scoring below this cosine similarity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    /// Number of embedding batches in flight while indexing
    pub embed_concurrency: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: None,
            embed_concurrency: 4,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::invalid_config("top_k must be at least 1"));
        }
        if self.embed_concurrency == 0 {
            return Err(Error::invalid_config("embed_concurrency must be at least 1"));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(Error::invalid_config(format!(
                    "similarity_threshold {} is outside [-1, 1]",
                    threshold
                )));
            }
        }
        Ok(())
    }
}

/// Embedding configuration (Ollama embeddings endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Passages per embedding batch
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(), // all-MiniLM-L6-v2, 384 dims
            batch_size: 16,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::invalid_config("embeddings.batch_size must be at least 1"));
        }
        Ok(())
    }
}

/// Generator backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions (Groq, OpenAI, vLLM)
    #[default]
    OpenAiCompatible,
}

/// Generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which backend serves generation
    pub backend: LlmBackend,
    /// Backend base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Upper bound on generated tokens (OpenAI-compatible only)
    pub max_tokens: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// API key; falls back to GROQ_API_KEY / OPENAI_API_KEY
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::OpenAiCompatible,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "deepseek-r1-distill-llama-70b".to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            timeout_secs: 180,
            max_retries: 2,
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Defaults for a local Ollama generator
    pub fn ollama() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "deepseek-r1:8b".to_string(),
            ..Self::default()
        }
    }

    /// Point generation at `backend`, keeping user-set values.
    ///
    /// `base_url` and `model` move to the new backend's defaults only while
    /// they still hold the old backend's defaults. Key, temperature, token
    /// limit, timeout and retries are never touched.
    pub fn switch_backend(&mut self, backend: LlmBackend) {
        if self.backend == backend {
            return;
        }
        let from = Self::defaults_for(&self.backend);
        let to = Self::defaults_for(&backend);
        if self.base_url == from.base_url {
            self.base_url = to.base_url;
        }
        if self.model == from.model {
            self.model = to.model;
        }
        self.backend = backend;
    }

    fn defaults_for(backend: &LlmBackend) -> Self {
        match backend {
            LlmBackend::Ollama => Self::ollama(),
            LlmBackend::OpenAiCompatible => Self::default(),
        }
    }

    /// API key from config, then the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Prompt and response post-processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Fixed question used both for retrieval and in the prompt
    pub question: String,
    /// Instruction template with `{context}` and `{question}` placeholders
    pub template: String,
    /// Delimiters of the model's reasoning trace
    pub reasoning_markers: ReasoningMarkers,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            question: DEFAULT_QUESTION.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            reasoning_markers: ReasoningMarkers::default(),
        }
    }
}

impl PromptConfig {
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(Error::invalid_config("prompt.question must not be empty"));
        }
        if !self.template.contains("{context}") {
            return Err(Error::invalid_config(
                "prompt.template must contain a {context} placeholder",
            ));
        }
        self.reasoning_markers.validate()
    }
}
