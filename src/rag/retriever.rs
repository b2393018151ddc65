use std::sync::Arc;

use tracing::debug;

use super::chunker::Segment;
use super::embedding::Embedder;
use super::index::{ScoredSegment, VectorIndex};
use crate::core::errors::RagError;

/// Embeds a question and looks it up in one document's index.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Most relevant segments first. An empty index yields no segments.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Segment>, RagError> {
        Ok(self
            .retrieve_scored(question, k)
            .await?
            .into_iter()
            .map(|scored| scored.segment)
            .collect())
    }

    pub async fn retrieve_scored(
        &self,
        question: &str,
        k: usize,
    ) -> Result<Vec<ScoredSegment>, RagError> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(question).await?;
        let results = self.index.query(&query, k)?;
        for hit in &results {
            debug!(segment = hit.segment.index, score = hit.score, "Retrieved segment");
        }
        Ok(results)
    }
}
