//! Ingestion pipeline.
//!
//! Discovers the corpus, extracts and chunks every document, embeds the
//! passages and persists the resulting index snapshot.

use crate::chunking::{Chunker, ChunkingConfig, RecursiveChunker};
use crate::config::Settings;
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, VedabotError};
use crate::loader::{discover_documents, load_document, LoadedDocument};
use crate::vector_store::{MemoryIndex, Passage, SnapshotInfo};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A document left out of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a completed ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    /// Documents that contributed to the index.
    pub documents_indexed: usize,
    /// Passages stored in the snapshot.
    pub passages_indexed: usize,
    /// Documents that failed to load.
    pub skipped: Vec<SkippedDocument>,
    /// Where the snapshot was written.
    pub index_path: PathBuf,
    /// Embedding dimension of the snapshot.
    pub dimension: usize,
    /// Metadata recorded in the snapshot.
    pub snapshot: SnapshotInfo,
}

/// Builds index snapshots from a directory of documents.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    chunker: Arc<dyn Chunker>,
    index_path: PathBuf,
    recursive: bool,
    max_concurrent: usize,
}

impl Indexer {
    /// Create an indexer from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let config = ChunkingConfig::try_from(&settings.chunking)?;
        let embedder = create_embedder(&settings.embedding)?;

        Ok(Self::with_components(
            embedder,
            Arc::new(RecursiveChunker::new(config)),
            settings.index_path(),
        )
        .recursive(settings.corpus.recursive)
        .max_concurrent(settings.ingest.max_concurrent_documents))
    }

    /// Create an indexer with custom components.
    pub fn with_components(
        embedder: Arc<dyn Embedder>,
        chunker: Arc<dyn Chunker>,
        index_path: PathBuf,
    ) -> Self {
        Self {
            embedder,
            chunker,
            index_path,
            recursive: false,
            max_concurrent: 4,
        }
    }

    /// Descend into subdirectories when discovering documents.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Limit the number of documents extracted at once.
    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Build and persist an index from every supported document in `dir`.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn build_index(&self, dir: &Path) -> Result<IngestionReport> {
        let paths = discover_documents(dir, self.recursive)?;
        if paths.is_empty() {
            return Err(VedabotError::EmptyCorpus(format!(
                "No supported documents found in {}",
                dir.display()
            )));
        }
        info!("Found {} documents", paths.len());

        let (documents, skipped) = self.load_all(paths).await;
        if documents.is_empty() {
            return Err(VedabotError::EmptyCorpus(format!(
                "All {} documents in {} failed to load",
                skipped.len(),
                dir.display()
            )));
        }

        let passages = self.chunk_all(&documents);
        if passages.is_empty() {
            return Err(VedabotError::EmptyCorpus(format!(
                "Documents in {} contain no extractable text ({} skipped)",
                dir.display(),
                skipped.len()
            )));
        }
        info!(
            "Chunked {} documents into {} passages",
            documents.len(),
            passages.len()
        );

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        let dimension = self.embedder.dimensions();
        let index = MemoryIndex::build(passages, vectors, dimension)?;

        let path = self.index_path.clone();
        let model = self.embedder.model_id().to_string();
        let (index, snapshot) = tokio::task::spawn_blocking(move || {
            let info = index.save(&path, &model)?;
            Ok::<_, VedabotError>((index, info))
        })
        .await
        .map_err(|e| VedabotError::Io(std::io::Error::other(e)))??;

        info!(
            "Saved index {} with {} passages to {:?}",
            snapshot.snapshot_id,
            index.passages().len(),
            self.index_path
        );

        Ok(IngestionReport {
            documents_indexed: documents.len(),
            passages_indexed: snapshot.passage_count,
            skipped,
            index_path: self.index_path.clone(),
            dimension,
            snapshot,
        })
    }

    /// Extract documents on blocking threads, restoring path order after.
    async fn load_all(&self, paths: Vec<PathBuf>) -> (Vec<LoadedDocument>, Vec<SkippedDocument>) {
        let mut outcomes: Vec<(PathBuf, Result<LoadedDocument>)> = stream::iter(paths)
            .map(|path| async move {
                let task_path = path.clone();
                let outcome = tokio::task::spawn_blocking(move || load_document(&task_path))
                    .await
                    .unwrap_or_else(|e| {
                        Err(VedabotError::DocumentParse {
                            path: path.clone(),
                            reason: format!("extraction task failed: {}", e),
                        })
                    });
                (path, outcome)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut documents = Vec::new();
        let mut skipped = Vec::new();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(doc) => {
                    debug!("Loaded {:?} ({} chars)", path, doc.char_count());
                    documents.push(doc);
                }
                Err(e) => {
                    let reason = match e {
                        VedabotError::DocumentParse { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!("Skipping {:?}: {}", path, reason);
                    skipped.push(SkippedDocument { path, reason });
                }
            }
        }
        (documents, skipped)
    }

    fn chunk_all(&self, documents: &[LoadedDocument]) -> Vec<Passage> {
        documents
            .iter()
            .flat_map(|doc| {
                doc.pages
                    .iter()
                    .flat_map(|page| self.chunker.chunk(&page.text, &doc.source, page.page))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::vector_store::{read_snapshot_info, VectorIndex};

    fn indexer(index_path: PathBuf) -> Indexer {
        Indexer::with_components(
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(RecursiveChunker::new(ChunkingConfig::default())),
            index_path,
        )
    }

    #[tokio::test]
    async fn test_empty_directory_is_empty_corpus() {
        let corpus = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let index_path = out.path().join("index.db");

        let err = indexer(index_path.clone())
            .build_index(corpus.path())
            .await
            .unwrap_err();

        assert!(matches!(err, VedabotError::EmptyCorpus(_)));
        assert!(!index_path.exists());
    }

    #[tokio::test]
    async fn test_single_short_document() {
        let corpus = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("Ginger.txt"), "Ginger reduces nausea.").unwrap();
        let out = tempfile::tempdir().unwrap();
        let index_path = out.path().join("index.db");

        let report = indexer(index_path.clone())
            .build_index(corpus.path())
            .await
            .unwrap();

        assert_eq!(report.documents_indexed, 1);
        assert_eq!(report.passages_indexed, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(report.dimension, 64);

        let info = read_snapshot_info(&index_path).unwrap();
        assert_eq!(info.passage_count, 1);
        assert_eq!(info.embedding_model, "hashing-64");

        let (index, _) = MemoryIndex::load(&index_path).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.passages()[0].content, "Ginger reduces nausea.");
    }

    #[tokio::test]
    async fn test_bad_document_is_skipped() {
        let corpus = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("broken.pdf"), b"not a pdf").unwrap();
        std::fs::write(corpus.path().join("tulsi.md"), "Tulsi supports immunity.").unwrap();
        let out = tempfile::tempdir().unwrap();

        let report = indexer(out.path().join("index.db"))
            .max_concurrent(2)
            .build_index(corpus.path())
            .await
            .unwrap();

        assert_eq!(report.documents_indexed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("broken.pdf"));
    }

    #[tokio::test]
    async fn test_all_documents_failing_is_empty_corpus() {
        let corpus = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("a.pdf"), b"garbage").unwrap();
        std::fs::write(corpus.path().join("b.pdf"), b"more garbage").unwrap();
        let out = tempfile::tempdir().unwrap();

        let err = indexer(out.path().join("index.db"))
            .build_index(corpus.path())
            .await
            .unwrap_err();

        match err {
            VedabotError::EmptyCorpus(msg) => assert!(msg.contains("All 2 documents")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_documents_are_empty_corpus() {
        let corpus = tempfile::tempdir().unwrap();
        std::fs::write(corpus.path().join("blank.txt"), "  \n\n  ").unwrap();
        let out = tempfile::tempdir().unwrap();
        let index_path = out.path().join("index.db");

        let err = indexer(index_path.clone())
            .build_index(corpus.path())
            .await
            .unwrap_err();

        assert!(matches!(err, VedabotError::EmptyCorpus(_)));
        assert!(!index_path.exists());
    }

    #[tokio::test]
    async fn test_passages_follow_path_order() {
        let corpus = tempfile::tempdir().unwrap();
        for name in ["c.txt", "a.txt", "b.txt"] {
            std::fs::write(corpus.path().join(name), format!("Contents of {name}")).unwrap();
        }
        let out = tempfile::tempdir().unwrap();
        let index_path = out.path().join("index.db");

        indexer(index_path.clone())
            .max_concurrent(3)
            .build_index(corpus.path())
            .await
            .unwrap();

        let (index, _) = MemoryIndex::load(&index_path).unwrap();
        let sources: Vec<_> = index
            .passages()
            .iter()
            .map(|p| Path::new(&p.metadata.source).file_name().unwrap().to_owned())
            .collect();
        assert_eq!(sources, vec!["a.txt", "b.txt", "c.txt"]);
    }
}
