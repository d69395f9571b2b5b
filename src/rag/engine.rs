//! Retrieval-QA engine.

use super::citation::add_sources_to_answer;
use super::conversation::{ConversationContext, Role};
use super::QueryResult;
use crate::config::{build_prompt, RetrievalSettings, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, VedabotError};
use crate::generation::{Generator, OpenAIGenerator};
use crate::vector_store::{MemoryIndex, Passage, SearchResult, VectorIndex};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Stage of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Received,
    Retrieving,
    Prompting,
    Generating,
    Assembling,
    Done,
    Failed,
}

impl QueryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Retrieving => "retrieving",
            Self::Prompting => "prompting",
            Self::Generating => "generating",
            Self::Assembling => "assembling",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bare answer and the passages it was generated from.
struct Answer {
    text: String,
    passages: Vec<Passage>,
}

/// Question-answering engine over a loaded index.
///
/// Holds no mutable state, so one engine can serve concurrent queries and a
/// dropped query future leaves nothing behind.
pub struct QaEngine {
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<dyn VectorIndex>>,
    generator: Arc<dyn Generator>,
    retrieval: RetrievalSettings,
    /// Deadline applied separately to retrieval and to generation.
    timeout: Duration,
}

impl QaEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Option<Arc<dyn VectorIndex>>,
        generator: Arc<dyn Generator>,
        retrieval: RetrievalSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            retrieval,
            timeout,
        }
    }

    /// Build providers from settings and load the index snapshot.
    ///
    /// A missing or unreadable snapshot leaves the engine without an index.
    /// A snapshot built with a different embedding model is an error.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder = create_embedder(&settings.embedding)?;
        let generator: Arc<dyn Generator> =
            Arc::new(OpenAIGenerator::from_settings(&settings.generation)?);

        let path = settings.index_path();
        let model = embedder.model_id().to_string();
        let dimension = embedder.dimensions();
        let loaded = tokio::task::spawn_blocking(move || {
            MemoryIndex::load_expecting(&path, &model, dimension)
        })
        .await
        .map_err(|e| VedabotError::IndexUnavailable(format!("Index load task failed: {}", e)))?;

        let index: Option<Arc<dyn VectorIndex>> = match loaded {
            Ok(index) => {
                debug!("Loaded index with {} passages", index.len());
                Some(Arc::new(index))
            }
            Err(VedabotError::IndexUnavailable(reason)) => {
                warn!("No usable index: {}", reason);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self::new(
            embedder,
            index,
            generator,
            settings.retrieval.clone(),
            settings.generation.timeout(),
        ))
    }

    /// Override the number of passages retrieved per query.
    pub fn with_k(mut self, k: usize) -> Self {
        self.retrieval.k = k.max(1);
        self
    }

    /// Enable or disable the reference list on answers.
    pub fn with_references(mut self, append: bool) -> Self {
        self.retrieval.append_references = append;
        self
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    fn index(&self) -> Result<&Arc<dyn VectorIndex>> {
        self.index.as_ref().ok_or_else(|| {
            VedabotError::IndexUnavailable("No index loaded. Run `vedabot ingest` first.".to_string())
        })
    }

    /// Retrieve the `k` passages closest to `question`.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        let index = self.index()?;
        let embedding = self.embedder.embed(question).await?;
        index.search(&embedding, k).await
    }

    /// Answer a single question.
    ///
    /// Returns `IndexUnavailable` when no index is loaded and `InvalidInput`
    /// for a blank question. Every other failure yields the fallback result.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn ask(&self, question: &str) -> Result<QueryResult> {
        if question.trim().is_empty() {
            return Err(VedabotError::InvalidInput("Question is empty".to_string()));
        }
        self.index()?;

        Ok(match self.answer(question).await {
            Ok(answer) => self.assemble(answer),
            Err(_) => QueryResult::fallback(),
        })
    }

    /// Answer the next message of a conversation.
    ///
    /// The user turn is appended before querying. The assistant turn is only
    /// appended on success and never carries the reference list.
    pub async fn chat(
        &self,
        context: &mut ConversationContext,
        message: &str,
    ) -> Result<QueryResult> {
        if message.trim().is_empty() {
            return Err(VedabotError::InvalidInput("Message is empty".to_string()));
        }
        self.index()?;

        context.append(Role::User, message);
        let question =
            context.render_with(self.retrieval.context_strategy, self.retrieval.context_window);

        match self.answer(&question).await {
            Ok(answer) => {
                context.append(Role::Assistant, answer.text.clone());
                Ok(self.assemble(answer))
            }
            Err(_) => Ok(QueryResult::fallback()),
        }
    }

    async fn answer(&self, question: &str) -> Result<Answer> {
        let mut state = QueryState::Received;
        debug!(%state, "Query received");

        let result = self.run_stages(question, &mut state).await;
        match &result {
            Ok(answer) => {
                state = QueryState::Done;
                debug!(%state, sources = answer.passages.len(), "Query complete");
            }
            Err(e) => {
                warn!(failed_in = %state, "Query failed: {}", e);
                state = QueryState::Failed;
                debug!(%state, "Returning fallback answer");
            }
        }
        result
    }

    async fn run_stages(&self, question: &str, state: &mut QueryState) -> Result<Answer> {
        *state = QueryState::Retrieving;
        debug!(%state, k = self.retrieval.k);
        let results = tokio::time::timeout(self.timeout, self.retrieve(question, self.retrieval.k))
            .await
            .map_err(|_| VedabotError::Timeout(self.timeout))??;
        let passages: Vec<Passage> = results.into_iter().map(|r| r.passage).collect();

        *state = QueryState::Prompting;
        debug!(%state, passages = passages.len());
        let prompt = build_prompt(&passages, question);

        *state = QueryState::Generating;
        debug!(%state, model = self.generator.model_id());
        let text = tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
            .await
            .map_err(|_| VedabotError::Timeout(self.timeout))??;

        if text.trim().is_empty() {
            return Err(VedabotError::ProviderUnavailable(
                "Model returned an empty answer".to_string(),
            ));
        }

        *state = QueryState::Assembling;
        debug!(%state);
        Ok(Answer { text, passages })
    }

    fn assemble(&self, answer: Answer) -> QueryResult {
        let result = if self.retrieval.append_references {
            add_sources_to_answer(
                &answer.text,
                &answer.passages,
                self.retrieval.citation_excerpt_chars,
            )
        } else {
            answer.text
        };

        QueryResult {
            result,
            source_documents: answer.passages,
        }
    }
}

/// Answer `question` against the snapshot configured in `settings`.
///
/// The snapshot is loaded fresh on every call. Never fails: any problem is
/// logged and the fallback result returned.
pub async fn handle_query(settings: &Settings, question: &str) -> QueryResult {
    let engine = match QaEngine::from_settings(settings).await {
        Ok(engine) => engine,
        Err(e) => {
            warn!("Failed to initialise query engine: {}", e);
            return QueryResult::fallback();
        }
    };

    match engine.ask(question).await {
        Ok(result) => {
            info!("Answered with {} sources", result.source_documents.len());
            result
        }
        Err(e) => {
            warn!("Query rejected: {}", e);
            QueryResult::fallback()
        }
    }
}
