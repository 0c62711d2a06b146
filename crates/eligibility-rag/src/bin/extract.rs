//! Eligibility extraction CLI
//!
//! Run with: cargo run -p eligibility-rag --bin eligibility-extract -- rfp.pdf

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use eligibility_rag::config::{ExtractionConfig, LlmBackend};
use eligibility_rag::providers::OllamaClient;
use eligibility_rag::Pipeline;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions (Groq by default)
    Openai,
}

#[derive(Parser, Debug)]
#[command(
    name = "eligibility-extract",
    version,
    about = "Extract mandatory eligibility criteria from an RFP document"
)]
struct Cli {
    /// Source document (.pdf, .txt or .md).
    input: PathBuf,

    /// Where to write the extracted criteria.
    #[arg(short, long, default_value = "eligibility_criteria.txt")]
    output: PathBuf,

    /// TOML configuration file; flags below override its values.
    #[arg(short, long, env = "ELIGIBILITY_CONFIG")]
    config: Option<PathBuf>,

    /// Passage window length in characters.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared by consecutive passages.
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Passages handed to the generator.
    #[arg(long)]
    top_k: Option<usize>,

    /// Drop passages scoring below this cosine similarity.
    #[arg(long)]
    min_similarity: Option<f32>,

    /// Generator backend.
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Generator model name.
    #[arg(long)]
    model: Option<String>,

    /// Embedding model name (served by Ollama).
    #[arg(long)]
    embedding_model: Option<String>,
}

impl Cli {
    fn load_config(&self) -> Result<ExtractionConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExtractionConfig::default(),
        };

        if let Some(backend) = self.backend {
            let wanted = match backend {
                Backend::Ollama => LlmBackend::Ollama,
                Backend::Openai => LlmBackend::OpenAiCompatible,
            };
            config.llm.switch_backend(wanted);
        }
        if let Some(size) = self.chunk_size {
            config.chunking.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunking.chunk_overlap = overlap;
        }
        if let Some(k) = self.top_k {
            config.retrieval.top_k = k;
        }
        if self.min_similarity.is_some() {
            config.retrieval.similarity_threshold = self.min_similarity;
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(model) = &self.embedding_model {
            config.embeddings.model = model.clone();
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eligibility_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {} ({:?})", config.llm.model, config.llm.backend);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    let ollama = OllamaClient::new(&config.embeddings.base_url, 5, 0)?;
    if !ollama.health_check().await {
        tracing::warn!("Ollama not available at {}", ollama.base_url());
        tracing::warn!(
            "  Start it with `ollama serve` and pull the model: ollama pull {}",
            config.embeddings.model
        );
    }

    let pipeline = Pipeline::from_config(config, &cli.output)?;
    let path = pipeline
        .run(&cli.input)
        .await
        .with_context(|| format!("extracting from {}", cli.input.display()))?;

    println!("Eligibility criteria saved to {}", path.display());
    Ok(())
}
