//! In-memory vector index implementation.
//!
//! Exact cosine search over every stored vector. Persistence lives in the
//! sibling `sqlite` module.

use super::{cosine_similarity, Passage, SearchResult, VectorIndex};
use crate::error::{Result, VedabotError};
use async_trait::async_trait;
use std::cmp::Ordering;
use tracing::debug;

/// An immutable index of passages and their embeddings.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    pub(super) passages: Vec<Passage>,
    pub(super) vectors: Vec<Vec<f32>>,
    pub(super) dimension: usize,
}

impl MemoryIndex {
    /// Build an index from passages and their vectors.
    ///
    /// Every vector must have exactly `dimension` components.
    pub fn build(passages: Vec<Passage>, vectors: Vec<Vec<f32>>, dimension: usize) -> Result<Self> {
        if passages.len() != vectors.len() {
            return Err(VedabotError::InvalidInput(format!(
                "{} passages but {} vectors",
                passages.len(),
                vectors.len()
            )));
        }
        if dimension == 0 {
            return Err(VedabotError::InvalidInput("index dimension must be positive".to_string()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(VedabotError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        debug!("Built in-memory index with {} passages (dim {})", passages.len(), dimension);

        Ok(Self {
            passages,
            vectors,
            dimension,
        })
    }

    /// Indexed passages in insertion order.
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query_embedding.len() != self.dimension {
            return Err(VedabotError::DimensionMismatch {
                expected: self.dimension,
                actual: query_embedding.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query_embedding, v)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                passage: self.passages[i].clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.passages.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
