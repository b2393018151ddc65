#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use profile_rag::core::config::RagSettings;
use profile_rag::core::errors::RagError;
use profile_rag::llm::{GenerationParams, LlmProvider, ProviderModel};
use profile_rag::rag::{AnswerGenerator, Embedder, Embedding, HashEmbedder};
use profile_rag::session::Session;

/// In-memory backend: replies are taken from a script, falling back to a
/// fixed answer once the script runs out. Every prompt is recorded.
pub struct ScriptedProvider {
    pub healthy: AtomicBool,
    replies: Mutex<VecDeque<Result<String, RagError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(true),
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn push_reply(&self, reply: Result<&str, RagError>) {
        self.replies
            .lock()
            .expect("replies lock")
            .push_back(reply.map(str::to_string));
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }

    async fn list_models(&self) -> Result<Vec<ProviderModel>, RagError> {
        Ok(vec![ProviderModel {
            id: "llama3:8b".to_string(),
            name: "llama3:8b".to_string(),
            size: None,
        }])
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
        _model_id: &str,
    ) -> Result<String, RagError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Ok("Scripted answer.".to_string()))
    }

    async fn embed(&self, _inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
        Err(RagError::BackendUnreachable("no embedding model".to_string()))
    }
}

/// Hash embedder that can be switched into a failing or hanging state.
pub struct FlakyEmbedder {
    inner: HashEmbedder,
    pub failing: AtomicBool,
    pub hanging: AtomicBool,
}

impl FlakyEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HashEmbedder::new(384).expect("embedder"),
            failing: AtomicBool::new(false),
            hanging: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn embed(&self, text: &str) -> Result<Embedding, RagError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RagError::EmbeddingUnavailable("model not loaded".to_string()));
        }
        if self.hanging.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.embed(text).await
    }
}

pub fn params() -> GenerationParams {
    GenerationParams {
        temperature: 0.7,
        top_p: 0.9,
        max_output_tokens: 500,
    }
}

pub fn small_chunks() -> RagSettings {
    RagSettings {
        chunk_size: 30,
        chunk_overlap: 5,
        top_k: 1,
        history_window: 10,
    }
}

pub fn session(provider: Arc<ScriptedProvider>, embedder: Arc<dyn Embedder>) -> Session {
    let generator = AnswerGenerator::new(provider, "llama3:8b", params(), Duration::from_secs(5), 10);
    Session::new(embedder, generator, &small_chunks()).expect("session")
}

pub const PEOPLE: &str = "Alice is an engineer.\nBob is a teacher.\nAlice studied physics.";
