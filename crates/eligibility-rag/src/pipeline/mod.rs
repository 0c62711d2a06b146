//! Linear extraction pipeline
//!
//! Each run walks `Loaded → Chunked → Indexed → Retrieved → Prompted →
//! Generated → Cleaned → Persisted`. Every transition consumes the previous
//! state's output; the first failure aborts the run and nothing is written.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::generation::{PromptBuilder, ResponseCleaner};
use crate::ingestion::{AutoReader, DocumentReader, TextChunker};
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use crate::retrieval::{Retriever, VectorIndex};
use crate::types::{Answer, Document, Passage, RetrievalResult};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Loaded,
    Chunked,
    Indexed,
    Retrieved,
    Prompted,
    Generated,
    Cleaned,
    Persisted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Loaded => "loaded",
            Stage::Chunked => "chunked",
            Stage::Indexed => "indexed",
            Stage::Retrieved => "retrieved",
            Stage::Prompted => "prompted",
            Stage::Generated => "generated",
            Stage::Cleaned => "cleaned",
            Stage::Persisted => "persisted",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a run: the output of the last completed stage
#[derive(Debug)]
pub enum PipelineState {
    /// Nothing done yet; holds the source document path
    Pending(PathBuf),
    Loaded(Document),
    Chunked(Vec<Passage>),
    Indexed(VectorIndex),
    Retrieved(RetrievalResult),
    Prompted(String),
    /// Raw generator output
    Generated(String),
    Cleaned(Answer),
    /// Terminal; holds the path written
    Persisted(PathBuf),
}

impl PipelineState {
    /// The completed stage, `None` before loading
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Pending(_) => None,
            PipelineState::Loaded(_) => Some(Stage::Loaded),
            PipelineState::Chunked(_) => Some(Stage::Chunked),
            PipelineState::Indexed(_) => Some(Stage::Indexed),
            PipelineState::Retrieved(_) => Some(Stage::Retrieved),
            PipelineState::Prompted(_) => Some(Stage::Prompted),
            PipelineState::Generated(_) => Some(Stage::Generated),
            PipelineState::Cleaned(_) => Some(Stage::Cleaned),
            PipelineState::Persisted(_) => Some(Stage::Persisted),
        }
    }

    /// The stage the next transition produces, `None` once persisted
    pub fn next_stage(&self) -> Option<Stage> {
        match self.stage() {
            None => Some(Stage::Loaded),
            Some(Stage::Loaded) => Some(Stage::Chunked),
            Some(Stage::Chunked) => Some(Stage::Indexed),
            Some(Stage::Indexed) => Some(Stage::Retrieved),
            Some(Stage::Retrieved) => Some(Stage::Prompted),
            Some(Stage::Prompted) => Some(Stage::Generated),
            Some(Stage::Generated) => Some(Stage::Cleaned),
            Some(Stage::Cleaned) => Some(Stage::Persisted),
            Some(Stage::Persisted) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Persisted(_))
    }
}

/// A failed run: the stage being entered and the underlying error
#[derive(Debug, thiserror::Error)]
#[error("Pipeline failed entering the {stage} stage: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

/// Single-document extraction pipeline
pub struct Pipeline {
    config: ExtractionConfig,
    reader: Arc<dyn DocumentReader>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    chunker: TextChunker,
    retriever: Retriever,
    cleaner: ResponseCleaner,
    output_path: PathBuf,
}

impl Pipeline {
    /// Assemble a pipeline from explicit collaborators.
    ///
    /// The config is validated here, before any file or network access.
    pub fn new(
        config: ExtractionConfig,
        reader: Arc<dyn DocumentReader>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        output_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;

        let output_path = output_path.into();
        if output_path.as_os_str().is_empty() {
            return Err(Error::invalid_config("Output path must not be empty"));
        }

        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let retriever = Retriever::new(config.retrieval.top_k, config.prompt.question.clone())
            .with_min_similarity(config.retrieval.similarity_threshold);
        let cleaner = ResponseCleaner::new(&config.prompt.reasoning_markers)?;

        Ok(Self {
            config,
            reader,
            embedder,
            llm,
            chunker,
            retriever,
            cleaner,
            output_path,
        })
    }

    /// Assemble a pipeline with the file-type reader and the backends named in the config
    pub fn from_config(config: ExtractionConfig, output_path: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        let embedder = providers::embedder_from_config(&config)?;
        let llm = providers::llm_from_config(&config)?;
        Self::new(config, Arc::new(AutoReader::default()), embedder, llm, output_path)
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Run every stage for `input`, returning the path of the written answer
    pub async fn run(&self, input: impl Into<PathBuf>) -> std::result::Result<PathBuf, StageError> {
        let mut state = PipelineState::Pending(input.into());

        while let Some(stage) = state.next_stage() {
            state = self.advance(state).await.map_err(|source| {
                tracing::error!("Stage {} failed ({}): {}", stage, source.kind(), source);
                StageError { stage, source }
            })?;
        }

        match state {
            PipelineState::Persisted(path) => Ok(path),
            other => Err(StageError {
                stage: Stage::Persisted,
                source: Error::malformed_output(format!(
                    "Run ended in the {:?} state",
                    other.stage()
                )),
            }),
        }
    }

    /// Perform exactly one transition. A persisted state is returned unchanged.
    pub async fn advance(&self, state: PipelineState) -> Result<PipelineState> {
        match state {
            PipelineState::Pending(path) => self.load(path).await.map(PipelineState::Loaded),

            PipelineState::Loaded(document) => {
                let passages = self.chunker.split(&document);
                tracing::info!(
                    "Chunked {} pages into {} passages",
                    document.page_count(),
                    passages.len()
                );
                Ok(PipelineState::Chunked(passages))
            }

            PipelineState::Chunked(passages) => {
                let index = VectorIndex::build(
                    passages,
                    self.embedder.as_ref(),
                    self.config.embeddings.batch_size,
                    self.config.retrieval.embed_concurrency,
                )
                .await?;
                Ok(PipelineState::Indexed(index))
            }

            PipelineState::Indexed(index) => {
                let result = self.retriever.retrieve(&index, self.embedder.as_ref()).await?;
                Ok(PipelineState::Retrieved(result))
            }

            PipelineState::Retrieved(result) => {
                let prompt = PromptBuilder::build(
                    &result,
                    &self.config.prompt.question,
                    &self.config.prompt.template,
                )?;
                tracing::info!("Prompt ready ({} passages)", result.len());
                Ok(PipelineState::Prompted(prompt))
            }

            PipelineState::Prompted(prompt) => {
                tracing::info!(
                    "Generating with {} ({})",
                    self.llm.name(),
                    self.llm.model()
                );
                let raw = self.llm.generate(&prompt).await?;
                tracing::debug!("Generator returned {} chars", raw.len());
                Ok(PipelineState::Generated(raw))
            }

            PipelineState::Generated(raw) => {
                let cleaned = self.cleaner.clean(&raw);
                if cleaned.is_empty() {
                    return Err(Error::malformed_output(
                        "Answer is empty after removing reasoning markup",
                    ));
                }
                tracing::info!("Cleaned answer: {} -> {} chars", raw.len(), cleaned.len());
                Ok(PipelineState::Cleaned(Answer { raw, cleaned }))
            }

            PipelineState::Cleaned(answer) => {
                let path = self.persist(answer).await?;
                tracing::info!("Answer written to {}", path.display());
                Ok(PipelineState::Persisted(path))
            }

            persisted @ PipelineState::Persisted(_) => Ok(persisted),
        }
    }

    async fn load(&self, path: PathBuf) -> Result<Document> {
        let reader = Arc::clone(&self.reader);
        let source = path.display().to_string();
        tracing::info!("Reading {} with {} reader", source, reader.name());

        let document = tokio::task::spawn_blocking(move || reader.read(&path))
            .await
            .map_err(|e| Error::source_read(&source, format!("Reader task failed: {}", e)))??;

        if document.is_blank() {
            tracing::warn!("{} contains no extractable text", source);
        }
        Ok(document)
    }

    async fn persist(&self, answer: Answer) -> Result<PathBuf> {
        let path = self.output_path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &answer.cleaned))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }
}

/// Write `contents` next to `path` and rename it into place
fn write_atomic(path: &Path, contents: &str) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Page;
    use async_trait::async_trait;

    struct StaticReader(Vec<&'static str>);

    impl DocumentReader for StaticReader {
        fn read(&self, path: &Path) -> Result<Document> {
            Ok(Document::from_texts(path.display().to_string(), self.0.clone()))
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, text.len() as f32 / 100.0])
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    struct FixedLlm(&'static str);

    #[async_trait]
    impl LlmProvider for FixedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-1"
        }
    }

    fn pipeline(pages: Vec<&'static str>, reply: &'static str, output: &Path) -> Pipeline {
        let mut config = ExtractionConfig::default();
        config.chunking.chunk_size = 20;
        config.chunking.chunk_overlap = 5;
        Pipeline::new(
            config,
            Arc::new(StaticReader(pages)),
            Arc::new(LengthEmbedder),
            Arc::new(FixedLlm(reply)),
            output,
        )
        .unwrap()
    }

    #[test]
    fn test_next_stage_walks_every_stage_once() {
        assert_eq!(
            PipelineState::Pending(PathBuf::from("rfp.pdf")).next_stage(),
            Some(Stage::Loaded)
        );
        assert_eq!(
            PipelineState::Generated(String::new()).next_stage(),
            Some(Stage::Cleaned)
        );
        assert_eq!(PipelineState::Persisted(PathBuf::new()).next_stage(), None);
        assert!(PipelineState::Persisted(PathBuf::new()).is_terminal());
    }

    #[tokio::test]
    async fn test_advance_one_transition_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("answer.txt");
        let pipeline = pipeline(vec!["Certification: ISO 9001"], "- ISO 9001", &out);

        let mut state = PipelineState::Pending(PathBuf::from("rfp.txt"));
        let mut seen = vec![];
        while !state.is_terminal() {
            state = pipeline.advance(state).await.unwrap();
            seen.push(state.stage().unwrap());
            if state.stage() != Some(Stage::Persisted) {
                assert!(!out.exists());
            }
        }

        assert_eq!(
            seen,
            vec![
                Stage::Loaded,
                Stage::Chunked,
                Stage::Indexed,
                Stage::Retrieved,
                Stage::Prompted,
                Stage::Generated,
                Stage::Cleaned,
                Stage::Persisted,
            ]
        );
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "- ISO 9001");
    }

    #[tokio::test]
    async fn test_advance_on_persisted_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("answer.txt");
        let pipeline = pipeline(vec!["text"], "ok", &out);

        let state = pipeline
            .advance(PipelineState::Persisted(out.clone()))
            .await
            .unwrap();
        assert!(matches!(state, PipelineState::Persisted(p) if p == out));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_clean_transition_rejects_reasoning_only_reply() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(vec!["text"], "", &dir.path().join("a.txt"));

        let err = pipeline
            .advance(PipelineState::Generated("<think>only thoughts</think>\n".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_clean_transition_keeps_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(vec!["text"], "", &dir.path().join("a.txt"));

        let raw = "<think>x</think>\n- Criterion".to_string();
        let state = pipeline
            .advance(PipelineState::Generated(raw.clone()))
            .await
            .unwrap();
        match state {
            PipelineState::Cleaned(answer) => {
                assert_eq!(answer.raw, raw);
                assert_eq!(answer.cleaned, "- Criterion");
            }
            other => panic!("unexpected state {:?}", other.stage()),
        }
    }

    #[tokio::test]
    async fn test_prompt_transition_rejects_empty_retrieval() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(vec!["text"], "unused", &dir.path().join("a.txt"));

        let err = pipeline
            .advance(PipelineState::Retrieved(RetrievalResult::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoRelevantPassages(_)));
    }

    #[tokio::test]
    async fn test_chunk_transition_uses_configured_window() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(vec![], "", &dir.path().join("a.txt"));

        let document = Document::new(
            "mem",
            crate::types::FileType::Txt,
            vec![Page::new(1, "a".repeat(35))],
        );
        let state = pipeline.advance(PipelineState::Loaded(document)).await.unwrap();
        match state {
            PipelineState::Chunked(passages) => {
                let spans: Vec<(usize, usize)> =
                    passages.iter().map(|p| (p.char_start, p.char_end)).collect();
                assert_eq!(spans, vec![(0, 20), (15, 35)]);
            }
            other => panic!("unexpected state {:?}", other.stage()),
        }
    }

    #[tokio::test]
    async fn test_run_reports_failing_stage() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("answer.txt");
        let pipeline = pipeline(vec![], "unused", &out);

        let err = pipeline.run("empty.txt").await.unwrap_err();
        assert_eq!(err.stage, Stage::Retrieved);
        assert!(matches!(err.source, Error::EmptyIndex));
        assert!(!out.exists());
    }

    #[test]
    fn test_write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/deeper/answer.txt");
        let written = write_atomic(&out, "- item").unwrap();
        assert_eq!(written, out);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "- item");
    }

    #[test]
    fn test_write_atomic_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("answer.txt");
        std::fs::write(&out, "old contents that are longer").unwrap();
        write_atomic(&out, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "new");
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = ExtractionConfig::default();
        config.retrieval.top_k = 0;
        let result = Pipeline::new(
            config,
            Arc::new(StaticReader(vec![])),
            Arc::new(LengthEmbedder),
            Arc::new(FixedLlm("x")),
            "out.txt",
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_stage_error_message_names_stage() {
        let err = StageError {
            stage: Stage::Indexed,
            source: Error::embedding("timeout"),
        };
        assert_eq!(
            err.to_string(),
            "Pipeline failed entering the indexed stage: Embedding generation failed: timeout"
        );
    }
}
