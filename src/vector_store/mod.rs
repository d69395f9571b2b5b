//! Vector index abstraction for Vedabot.
//!
//! Provides a trait-based interface for nearest-neighbour lookup over
//! passages, plus the in-memory index and its SQLite snapshot format.

mod memory;
mod sqlite;

pub use memory::MemoryIndex;
pub use sqlite::{read_snapshot_info, SnapshotInfo};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provenance of a passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// Identifier of the originating document (its path).
    pub source: String,
    /// 1-based page number, when the source is paginated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Position of this passage within its page or document.
    pub chunk_index: usize,
}

impl PassageMetadata {
    pub fn new(source: impl Into<String>, page: Option<u32>, chunk_index: usize) -> Self {
        Self {
            source: source.into(),
            page,
            chunk_index,
        }
    }
}

/// A unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Raw text content.
    #[serde(rename = "text")]
    pub content: String,
    /// Where the text came from.
    pub metadata: PassageMetadata,
}

impl Passage {
    pub fn new(content: String, metadata: PassageMetadata) -> Self {
        Self { content, metadata }
    }
}

/// A search result with score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The matched passage.
    pub passage: Passage,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Trait for vector index implementations.
///
/// Implementations are read-only once built, so a single index can serve
/// any number of concurrent queries.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `k` passages ordered by descending similarity.
    ///
    /// Passages with equal scores keep their insertion order.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of indexed passages.
    fn len(&self) -> usize;

    /// Whether the index holds no passages.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality shared by every stored vector.
    fn dimension(&self) -> usize;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_passage_serializes_as_text_and_metadata() {
        let passage = Passage::new(
            "Ginger reduces nausea.".to_string(),
            PassageMetadata::new("data/ginger.pdf", Some(3), 0),
        );
        let json = serde_json::to_value(&passage).unwrap();

        assert_eq!(json["text"], "Ginger reduces nausea.");
        assert_eq!(json["metadata"]["source"], "data/ginger.pdf");
        assert_eq!(json["metadata"]["page"], 3);
    }
}
