//! Text → vector embedders.
//!
//! [`HashEmbedder`] is a model-free lexical embedder: lower-cased word tokens
//! and their character trigrams are hashed into a fixed-size bag and
//! L2-normalized, so cosine similarity tracks lexical overlap and output is
//! bit-stable across runs. [`ProviderEmbedder`] forwards to the language
//! model backend's embedding endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::core::errors::RagError;
use crate::llm::LlmProvider;
use crate::vector_math::l2_normalize;

pub type Embedding = Vec<f32>;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Embedding, RagError>;

    /// Embeds every input, preserving order. Any failure fails the batch.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, RagError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self, RagError> {
        if dimension == 0 {
            return Err(RagError::EmbeddingUnavailable(
                "hash embedder dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model_name: format!("hash-{}", dimension),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();

        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[self.bucket("w:", token)] += WORD_WEIGHT;

            let chars: Vec<char> = token.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket("c:", &trigram)] += TRIGRAM_WEIGHT;
            }
        }

        l2_normalize(&mut vector);
        vector
    }

    fn bucket(&self, prefix: &str, feature: &str) -> usize {
        let mut hasher = Sha256::new();
        hasher.update(prefix.as_bytes());
        hasher.update(feature.as_bytes());
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(head) % self.dimension as u64) as usize
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, text: &str) -> Result<Embedding, RagError> {
        Ok(self.embed_text(text))
    }
}

pub struct ProviderEmbedder {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Embedding, RagError> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::EmbeddingUnavailable("empty embedding response".to_string()))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self
            .provider
            .embed(texts, &self.model)
            .await
            .map_err(|err| {
                RagError::EmbeddingUnavailable(format!(
                    "{} via {}: {}",
                    self.model,
                    self.provider.name(),
                    err
                ))
            })?;

        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        let dimension = vectors[0].len();
        if dimension == 0 || vectors.iter().any(|v| v.len() != dimension) {
            return Err(RagError::EmbeddingUnavailable(
                "embedding dimensions are inconsistent".to_string(),
            ));
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationParams, ProviderModel};
    use crate::vector_math::cosine_similarity;

    struct FixedProvider {
        rows: Result<Vec<Vec<f32>>, RagError>,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn health_check(&self) -> Result<bool, RagError> {
            Ok(true)
        }

        async fn list_models(&self) -> Result<Vec<ProviderModel>, RagError> {
            Ok(Vec::new())
        }

        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
            _model_id: &str,
        ) -> Result<String, RagError> {
            Ok(String::new())
        }

        async fn embed(&self, _inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
            self.rows.clone()
        }
    }

    #[test]
    fn hash_embedding_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(384).expect("embedder");
        let first = embedder.embed_text("Alice studied physics.");
        let second = embedder.embed_text("Alice studied physics.");

        assert_eq!(first, second);
        assert_eq!(first.len(), 384);
        let norm: f32 = first.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn case_and_punctuation_do_not_matter() {
        let embedder = HashEmbedder::new(128).expect("embedder");
        assert_eq!(
            embedder.embed_text("Bob, TEACHER!"),
            embedder.embed_text("bob teacher")
        );
    }

    #[test]
    fn lexical_overlap_drives_similarity() {
        let embedder = HashEmbedder::new(384).expect("embedder");
        let query = embedder.embed_text("What did Alice study?");
        let related = embedder.embed_text("Alice studied physics.");
        let unrelated = embedder.embed_text("Bob is a teacher.");

        let close = cosine_similarity(&query, &related).expect("cosine");
        let far = cosine_similarity(&query, &unrelated).expect("cosine");
        assert!(close > far);
    }

    #[test]
    fn blank_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new(16).expect("embedder");
        assert!(embedder.embed_text("  \n ").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            HashEmbedder::new(0),
            Err(RagError::EmbeddingUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn embed_many_preserves_order() {
        let embedder = HashEmbedder::new(64).expect("embedder");
        let texts = vec!["one".to_string(), "two".to_string()];
        let vectors = embedder.embed_many(&texts).await.expect("embed");
        assert_eq!(vectors[0], embedder.embed_text("one"));
        assert_eq!(vectors[1], embedder.embed_text("two"));
    }

    #[tokio::test]
    async fn provider_failures_become_embedding_unavailable() {
        let failing = ProviderEmbedder::new(
            Arc::new(FixedProvider {
                rows: Err(RagError::BackendUnreachable("connection refused".to_string())),
            }),
            "all-minilm",
        );
        let err = failing.embed("text").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingUnavailable(_)));

        let short = ProviderEmbedder::new(
            Arc::new(FixedProvider {
                rows: Ok(vec![vec![1.0, 0.0]]),
            }),
            "all-minilm",
        );
        let texts = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(
            short.embed_many(&texts).await,
            Err(RagError::EmbeddingUnavailable(_))
        ));
    }
}
