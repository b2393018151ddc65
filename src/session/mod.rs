//! Session orchestration: `Empty → Indexed → Ready`.
//!
//! A [`Session`] owns the document, its index and the conversation log.
//! Rebuilding replaces the document and index atomically on success and
//! keeps the previous ones on failure; the conversation log is never touched
//! by a rebuild.

mod presets;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::config::RagSettings;
use crate::core::errors::RagError;
use crate::llm::ensure_backend_available;
use crate::memory::{ConversationMemory, Turn, TurnHandle};
use crate::rag::{
    AnswerGenerator, Chunker, ChunkerConfig, Document, DocumentStats, Embedder, Retriever,
    Segment, VectorIndex,
};
use crate::source::validate_source_text;

pub use presets::QuickQuestion;

pub type SharedSession = Arc<Mutex<Session>>;

const CANCELLED_ANSWER: &str = "Error processing question: cancelled before an answer was produced";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    Indexed,
    Ready,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub source: String,
    #[serde(flatten)]
    pub stats: DocumentStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub state: SessionState,
    pub model: String,
    pub embedding_model: String,
    pub document: Option<DocumentSummary>,
    pub turns: Vec<Turn>,
}

struct IndexedDocument {
    document: Document,
    retriever: Retriever,
}

pub struct Session {
    id: Uuid,
    state: SessionState,
    chunker: Chunker,
    top_k: usize,
    embedder: Arc<dyn Embedder>,
    generator: AnswerGenerator,
    indexed: Option<IndexedDocument>,
    memory: ConversationMemory,
}

impl Session {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: AnswerGenerator,
        settings: &RagSettings,
    ) -> Result<Self, RagError> {
        Ok(Self {
            id: Uuid::new_v4(),
            state: SessionState::Empty,
            chunker: Chunker::new(ChunkerConfig::from(settings))?,
            top_k: settings.top_k,
            embedder,
            generator,
            indexed: None,
            memory: ConversationMemory::new(),
        })
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn document(&self) -> Option<&Document> {
        self.indexed.as_ref().map(|i| &i.document)
    }

    pub fn stats(&self) -> Option<DocumentStats> {
        self.indexed
            .as_ref()
            .map(|i| i.document.stats(i.retriever.index().len()))
    }

    /// Validates text from an upstream source before indexing it.
    pub async fn load_source(
        &mut self,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<DocumentStats, RagError> {
        let text = text.into();
        validate_source_text(&text)?;
        self.build_index(Document::new(text, source)).await
    }

    /// Chunk → embed → index. Zero segments is a valid index.
    pub async fn build_index(&mut self, document: Document) -> Result<DocumentStats, RagError> {
        if self.memory.pending().is_some() {
            return Err(RagError::SessionBusy);
        }
        ensure_backend_available(self.generator.provider().as_ref()).await?;

        let segments = self.chunker.split(document.text());
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let vectors = self.embedder.embed_many(&texts).await.map_err(|err| match err {
            RagError::EmbeddingUnavailable(_) => err,
            other => RagError::EmbeddingUnavailable(other.to_string()),
        })?;
        let index = VectorIndex::build(segments, vectors)?;

        let stats = document.stats(index.len());
        info!(
            session = %self.id,
            source = document.source(),
            segments = stats.segments,
            characters = stats.characters,
            "Built document index"
        );

        self.indexed = Some(IndexedDocument {
            document,
            retriever: Retriever::new(self.embedder.clone(), Arc::new(index)),
        });
        self.state = SessionState::Indexed;
        Ok(stats)
    }

    /// Runs one question to completion. Backend and retrieval failures are
    /// recorded on the returned turn rather than returned as errors.
    pub async fn ask(&mut self, question: &str) -> Result<Turn, RagError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidInput("question must not be empty".to_string()));
        }
        let retriever = match (&self.indexed, self.state) {
            (Some(indexed), SessionState::Indexed | SessionState::Ready) => {
                indexed.retriever.clone()
            }
            _ => return Err(RagError::NotIndexed),
        };
        if self.memory.pending().is_some() {
            return Err(RagError::SessionBusy);
        }

        let timeout = self.generator.timeout();
        let pending = PendingTurn::open(&mut self.memory, question);

        let retrieval = tokio::time::timeout(timeout, retriever.retrieve(question, self.top_k))
            .await
            .unwrap_or_else(|_| Err(RagError::BackendTimeout(timeout.as_secs())));
        let (answer, evidence, success) = match retrieval {
            Ok(evidence) => {
                let generation = self
                    .generator
                    .generate(question, &evidence, pending.history())
                    .await;
                (generation.answer, evidence, generation.success)
            }
            Err(err) => {
                warn!(session = %self.id, "Retrieval failed: {}", err);
                (format!("Error processing question: {}", err), Vec::new(), false)
            }
        };

        let turn = pending.resolve(answer, evidence, success)?;
        if success && self.state == SessionState::Indexed {
            self.state = SessionState::Ready;
        }
        Ok(turn)
    }

    pub async fn ask_preset(&mut self, preset: QuickQuestion) -> Result<Turn, RagError> {
        self.ask(preset.question()).await
    }

    /// Empties the conversation log. The index is untouched.
    pub fn clear_history(&mut self) {
        self.memory.clear();
        info!(session = %self.id, "Cleared conversation history");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            state: self.state,
            model: self.generator.model().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            document: self.indexed.as_ref().map(|i| DocumentSummary {
                source: i.document.source().to_string(),
                stats: i.document.stats(i.retriever.index().len()),
            }),
            turns: self.memory.all().to_vec(),
        }
    }
}

/// A question in flight. Dropping it unresolved, as happens when the `ask`
/// future is cancelled, records the turn as failed.
struct PendingTurn<'a> {
    memory: &'a mut ConversationMemory,
    handle: TurnHandle,
    resolved: bool,
}

impl<'a> PendingTurn<'a> {
    fn open(memory: &'a mut ConversationMemory, question: &str) -> Self {
        let handle = memory.append(question);
        Self {
            memory,
            handle,
            resolved: false,
        }
    }

    fn history(&self) -> &ConversationMemory {
        &*self.memory
    }

    fn resolve(
        mut self,
        answer: String,
        evidence: Vec<Segment>,
        success: bool,
    ) -> Result<Turn, RagError> {
        self.resolved = true;
        let turn = if success {
            self.memory.set_answer(self.handle, answer, evidence)?
        } else {
            self.memory.set_failure(self.handle, answer, evidence)?
        };
        Ok(turn.clone())
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        warn!(turn = self.handle.id(), "Question cancelled before it was answered");
        let _ = self
            .memory
            .set_failure(self.handle, CANCELLED_ANSWER, Vec::new());
    }
}

/// Takes the session lock without waiting; a held lock means a question or
/// build is in flight.
pub fn try_acquire(session: &SharedSession) -> Result<OwnedMutexGuard<Session>, RagError> {
    session
        .clone()
        .try_lock_owned()
        .map_err(|_| RagError::SessionBusy)
}
