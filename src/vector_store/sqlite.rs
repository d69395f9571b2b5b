//! SQLite snapshot persistence for the in-memory index.
//!
//! A snapshot is written into a temporary file next to the target and then
//! renamed over it, so a reader sees either the previous complete snapshot or
//! the new one. The `meta` table records the passage count and dimension and
//! is checked on load.

use super::{MemoryIndex, Passage, PassageMetadata};
use crate::error::{Result, VedabotError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Snapshot format written by this version.
const FORMAT_VERSION: u32 = 1;

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE passages (
        position INTEGER PRIMARY KEY,
        source TEXT NOT NULL,
        page INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );
"#;

/// Summary of a persisted snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    /// Unique id assigned when the snapshot was written.
    pub snapshot_id: Uuid,
    /// Embedding model the vectors were produced with.
    pub embedding_model: String,
    /// Vector dimensionality.
    pub dimension: usize,
    /// Number of stored passages.
    pub passage_count: usize,
    /// When the snapshot was written.
    pub created_at: DateTime<Utc>,
}

impl MemoryIndex {
    /// Persist the index to `path`, replacing any previous snapshot.
    #[instrument(skip(self))]
    pub fn save(&self, path: &Path, embedding_model: &str) -> Result<SnapshotInfo> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        std::fs::create_dir_all(&parent)?;

        let tmp = tempfile::Builder::new()
            .prefix(".vedabot-index-")
            .suffix(".tmp")
            .tempfile_in(&parent)?;

        let info = SnapshotInfo {
            snapshot_id: Uuid::new_v4(),
            embedding_model: embedding_model.to_string(),
            dimension: self.dimension,
            passage_count: self.passages.len(),
            created_at: Utc::now(),
        };

        {
            let mut conn = Connection::open(tmp.path())?;
            conn.execute_batch(SCHEMA)?;

            let tx = conn.transaction()?;
            for (position, (passage, vector)) in self.passages.iter().zip(&self.vectors).enumerate() {
                tx.execute(
                    r#"
                    INSERT INTO passages (position, source, page, chunk_index, content, embedding)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        position as i64,
                        passage.metadata.source,
                        passage.metadata.page,
                        passage.metadata.chunk_index as i64,
                        passage.content,
                        embedding_to_bytes(vector),
                    ],
                )?;
            }

            // Written last: a snapshot without meta rows is never loadable.
            for (key, value) in [
                ("format_version", FORMAT_VERSION.to_string()),
                ("snapshot_id", info.snapshot_id.to_string()),
                ("embedding_model", info.embedding_model.clone()),
                ("dimension", info.dimension.to_string()),
                ("passage_count", info.passage_count.to_string()),
                ("created_at", info.created_at.to_rfc3339()),
            ] {
                tx.execute("INSERT INTO meta (key, value) VALUES (?1, ?2)", params![key, value])?;
            }
            tx.commit()?;

            conn.close().map_err(|(_, e)| VedabotError::Database(e))?;
        }

        tmp.persist(path).map_err(|e| VedabotError::Io(e.error))?;

        info!(
            "Saved index snapshot {} ({} passages, dim {}) to {:?}",
            info.snapshot_id, info.passage_count, info.dimension, path
        );

        Ok(info)
    }

    /// Load a snapshot written by [`MemoryIndex::save`].
    ///
    /// Fails with `IndexUnavailable` unless the file is a complete snapshot.
    #[instrument]
    pub fn load(path: &Path) -> Result<(Self, SnapshotInfo)> {
        if !path.is_file() {
            return Err(VedabotError::IndexUnavailable(format!(
                "no index snapshot at {}; run `vedabot ingest` first",
                path.display()
            )));
        }

        let unavailable = |reason: String| {
            VedabotError::IndexUnavailable(format!("{}: {}", path.display(), reason))
        };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| unavailable(e.to_string()))?;

        let info = read_meta(&conn).map_err(|e| unavailable(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT source, page, chunk_index, content, embedding
                FROM passages
                ORDER BY position
                "#,
            )
            .map_err(|e| unavailable(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let chunk_index: i64 = row.get(2)?;
                let embedding_bytes: Vec<u8> = row.get(4)?;
                Ok((
                    Passage::new(
                        row.get(3)?,
                        PassageMetadata::new(
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<u32>>(1)?,
                            chunk_index as usize,
                        ),
                    ),
                    bytes_to_embedding(&embedding_bytes),
                ))
            })
            .map_err(|e| unavailable(e.to_string()))?;

        let mut passages = Vec::with_capacity(info.passage_count);
        let mut vectors = Vec::with_capacity(info.passage_count);
        for row in rows {
            let (passage, vector) = row.map_err(|e| unavailable(e.to_string()))?;
            passages.push(passage);
            vectors.push(vector);
        }

        if passages.len() != info.passage_count {
            return Err(unavailable(format!(
                "snapshot records {} passages but holds {}",
                info.passage_count,
                passages.len()
            )));
        }

        let index = MemoryIndex::build(passages, vectors, info.dimension)
            .map_err(|e| unavailable(e.to_string()))?;
        debug!("Loaded snapshot {} from {:?}", info.snapshot_id, path);

        Ok((index, info))
    }

    /// Load a snapshot and check it was built with the expected embedding space.
    pub fn load_expecting(path: &Path, embedding_model: &str, dimension: usize) -> Result<Self> {
        let (index, info) = Self::load(path)?;

        if info.dimension != dimension {
            return Err(VedabotError::DimensionMismatch {
                expected: dimension,
                actual: info.dimension,
            });
        }
        if info.embedding_model != embedding_model {
            return Err(VedabotError::Config(format!(
                "index was built with embedding model '{}' but '{}' is configured; re-run ingest",
                info.embedding_model, embedding_model
            )));
        }

        Ok(index)
    }
}

/// Read the snapshot summary without loading passages.
pub fn read_snapshot_info(path: &Path) -> Result<SnapshotInfo> {
    if !path.is_file() {
        return Err(VedabotError::IndexUnavailable(format!(
            "no index snapshot at {}",
            path.display()
        )));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    read_meta(&conn)
}

fn read_meta(conn: &Connection) -> Result<SnapshotInfo> {
    let get = |key: &str| -> Result<String> {
        conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?
            .ok_or_else(|| VedabotError::IndexUnavailable(format!("snapshot is missing '{}'", key)))
    };
    let parse_usize = |key: &str| -> Result<usize> {
        get(key)?
            .parse()
            .map_err(|_| VedabotError::IndexUnavailable(format!("snapshot has a malformed '{}'", key)))
    };

    let version: u32 = get("format_version")?
        .parse()
        .map_err(|_| VedabotError::IndexUnavailable("malformed format_version".to_string()))?;
    if version != FORMAT_VERSION {
        return Err(VedabotError::IndexUnavailable(format!(
            "unsupported snapshot format {}",
            version
        )));
    }

    Ok(SnapshotInfo {
        snapshot_id: Uuid::parse_str(&get("snapshot_id")?).unwrap_or_default(),
        embedding_model: get("embedding_model")?,
        dimension: parse_usize("dimension")?,
        passage_count: parse_usize("passage_count")?,
        created_at: DateTime::parse_from_rfc3339(&get("created_at")?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::VectorIndex;

    fn sample_index() -> MemoryIndex {
        let passages = (0..4)
            .map(|i| {
                Passage::new(
                    format!("passage number {}", i),
                    PassageMetadata::new("data/herbs.pdf", if i % 2 == 0 { Some(i + 1) } else { None }, i as usize),
                )
            })
            .collect();
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.7, 0.7, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.7, 0.7, 0.0],
        ];
        MemoryIndex::build(passages, vectors, 3).unwrap()
    }

    #[tokio::test]
    async fn test_save_load_search_equivalence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let index = sample_index();

        index.save(&path, "test-model").unwrap();
        let (loaded, info) = MemoryIndex::load(&path).unwrap();

        assert_eq!(info.passage_count, 4);
        assert_eq!(info.dimension, 3);
        assert_eq!(info.embedding_model, "test-model");
        assert_eq!(loaded.passages(), index.passages());

        for query in [[1.0, 0.2, 0.0], [0.5, 0.5, 0.0], [0.0, 0.0, 1.0]] {
            let before = index.search(&query, 3).await.unwrap();
            let after = loaded.search(&query, 3).await.unwrap();
            assert_eq!(before.len(), after.len());
            for (a, b) in before.iter().zip(&after) {
                assert_eq!(a.passage, b.passage);
                assert!((a.score - b.score).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        sample_index().save(&path, "m").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["index.db".to_string()]);
    }

    #[test]
    fn test_save_creates_missing_index_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");

        sample_index().save(&path, "m").unwrap();
        assert!(MemoryIndex::load(&path).is_ok());
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        sample_index().save(&path, "m").unwrap();

        let smaller = MemoryIndex::build(
            vec![Passage::new("only".into(), PassageMetadata::new("a.txt", None, 0))],
            vec![vec![0.0, 0.0, 1.0]],
            3,
        )
        .unwrap();
        smaller.save(&path, "m").unwrap();

        let (loaded, _) = MemoryIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = MemoryIndex::load(&dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, VedabotError::IndexUnavailable(_)));
    }

    #[test]
    fn test_load_garbage_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        std::fs::write(&path, b"definitely not sqlite").unwrap();

        let err = MemoryIndex::load(&path).unwrap_err();
        assert!(matches!(err, VedabotError::IndexUnavailable(_)));
    }

    #[test]
    fn test_load_incomplete_snapshot_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA).unwrap();
            conn.execute(
                "INSERT INTO passages (position, source, page, chunk_index, content, embedding) VALUES (0, 'a', NULL, 0, 'x', ?1)",
                params![embedding_to_bytes(&[1.0, 0.0])],
            )
            .unwrap();
        }

        let err = MemoryIndex::load(&path).unwrap_err();
        assert!(matches!(err, VedabotError::IndexUnavailable(_)));
    }

    #[test]
    fn test_load_truncated_snapshot_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        sample_index().save(&path, "m").unwrap();
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute("DELETE FROM passages WHERE position = 0", []).unwrap();
        }

        let err = MemoryIndex::load(&path).unwrap_err();
        assert!(
            matches!(&err, VedabotError::IndexUnavailable(msg) if msg.contains("records 4 passages but holds 3"))
        );
    }

    #[test]
    fn test_load_expecting_rejects_other_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        sample_index().save(&path, "m").unwrap();

        let err = MemoryIndex::load_expecting(&path, "m", 384).unwrap_err();
        assert!(matches!(err, VedabotError::DimensionMismatch { expected: 384, actual: 3 }));
        assert!(MemoryIndex::load_expecting(&path, "other", 3).is_err());
        assert!(MemoryIndex::load_expecting(&path, "m", 3).is_ok());
    }

    #[test]
    fn test_read_snapshot_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let saved = sample_index().save(&path, "m").unwrap();

        let info = read_snapshot_info(&path).unwrap();
        assert_eq!(info.snapshot_id, saved.snapshot_id);
        assert_eq!(info.passage_count, 4);
    }
}
