use serde::Serialize;

use super::chunker::Segment;
use super::embedding::Embedding;
use crate::core::errors::RagError;
use crate::vector_math::rank_descending_by_cosine;

/// A segment returned by [`VectorIndex::query`] with its cosine score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub score: f32,
}

/// In-memory (segment, vector) pairs for one document. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    segments: Vec<Segment>,
    vectors: Vec<Embedding>,
    dimension: usize,
}

impl VectorIndex {
    pub fn build(segments: Vec<Segment>, vectors: Vec<Embedding>) -> Result<Self, RagError> {
        if segments.len() != vectors.len() {
            return Err(RagError::InvalidInput(format!(
                "{} segments but {} vectors",
                segments.len(),
                vectors.len()
            )));
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if let Some(position) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(RagError::InvalidInput(format!(
                "vector {} has dimension {}, expected {}",
                position,
                vectors[position].len(),
                dimension
            )));
        }
        if !vectors.is_empty() && dimension == 0 {
            return Err(RagError::InvalidInput(
                "vectors must not be empty".to_string(),
            ));
        }

        Ok(Self {
            segments,
            vectors,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The `k` most similar entries, best first. Equal scores keep insertion
    /// order. `k` is clamped to the index size.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredSegment>, RagError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let ranked = rank_descending_by_cosine(vector, &self.vectors)?;
        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(idx, score)| ScoredSegment {
                segment: self.segments[idx].clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(index: usize, text: &str) -> Segment {
        Segment {
            index,
            text: text.to_string(),
            start_offset: index * 10,
            end_offset: index * 10 + text.chars().count(),
        }
    }

    fn sample_index() -> VectorIndex {
        VectorIndex::build(
            vec![segment(0, "a"), segment(1, "b"), segment(2, "c"), segment(3, "d")],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.7, 0.7, 0.0],
                vec![2.0, 0.0, 0.0],
            ],
        )
        .expect("index builds")
    }

    #[test]
    fn query_returns_at_most_k_sorted_results() {
        let index = sample_index();
        let results = index.query(&[1.0, 0.1, 0.0], 2).expect("query");

        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn self_similarity_is_top_result() {
        let index = sample_index();
        let results = index.query(&[0.0, 1.0, 0.0], 4).expect("query");
        assert_eq!(results[0].segment.text, "b");
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = sample_index();
        // segments 0 and 3 point the same way
        let results = index.query(&[5.0, 0.0, 0.0], 2).expect("query");
        assert_eq!(results[0].segment.index, 0);
        assert_eq!(results[1].segment.index, 3);
    }

    #[test]
    fn k_is_clamped_to_index_size() {
        let index = sample_index();
        assert_eq!(index.query(&[1.0, 1.0, 1.0], 50).expect("query").len(), 4);
        assert!(index.query(&[1.0, 1.0, 1.0], 0).expect("query").is_empty());
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = VectorIndex::build(Vec::new(), Vec::new()).expect("empty index");
        assert!(index.is_empty());
        assert!(index.query(&[1.0, 0.0], 3).expect("query").is_empty());
    }

    #[test]
    fn build_rejects_mismatched_inputs() {
        let err = VectorIndex::build(vec![segment(0, "a")], Vec::new()).unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));

        let err = VectorIndex::build(
            vec![segment(0, "a"), segment(1, "b")],
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
    }

    #[test]
    fn query_dimension_mismatch_is_an_error() {
        let index = sample_index();
        assert!(index.query(&[1.0, 0.0], 1).is_err());
    }
}
