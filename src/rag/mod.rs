//! Retrieval-augmented generation pipeline parts.
//!
//! - `chunker`: overlapping segment splitting
//! - `embedding`: hash and provider-backed embedders
//! - `index`: in-memory cosine similarity index
//! - `retriever`: question → ranked segments
//! - `generator`: prompt assembly and backend call

pub mod chunker;
pub mod document;
pub mod embedding;
pub mod generator;
pub mod index;
pub mod retriever;

pub use chunker::{Chunker, ChunkerConfig, Segment};
pub use document::{Document, DocumentStats};
pub use embedding::{Embedder, Embedding, HashEmbedder, ProviderEmbedder};
pub use generator::{AnswerGenerator, Generation, EMPTY_ANSWER_FALLBACK};
pub use index::{ScoredSegment, VectorIndex};
pub use retriever::Retriever;
