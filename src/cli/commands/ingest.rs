//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VedabotError;
use crate::indexer::Indexer;
use anyhow::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Advisory lock held while an index is being rebuilt.
///
/// The OS releases the lock when the process exits, so a lock file left
/// behind by a crashed ingest does not block the next one.
struct IngestLock {
    file: File,
}

impl IngestLock {
    fn acquire(index_path: &Path) -> crate::Result<Self> {
        let mut name = index_path.as_os_str().to_owned();
        name.push(".lock");
        let path = PathBuf::from(name);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(VedabotError::Config(format!(
                "Another ingest is running (lock file {})",
                path.display()
            )));
        }
        Ok(Self { file })
    }
}

impl Drop for IngestLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release ingest lock: {}", e);
        }
    }
}

/// Run the ingest command.
pub async fn run_ingest(source: Option<&str>, recursive: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vedabot doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let source_dir = source
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.corpus_dir());

    let indexer = Indexer::new(&settings)?.recursive(recursive || settings.corpus.recursive);

    if let Some(parent) = indexer.index_path().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _lock = IngestLock::acquire(indexer.index_path())?;

    let spinner = Output::spinner(&format!("Indexing documents in {}...", source_dir.display()));
    let result = indexer.build_index(&source_dir).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!(
        "Indexed {} passages from {} documents",
        report.passages_indexed, report.documents_indexed
    ));
    Output::kv("Index", &report.index_path.display().to_string());
    Output::kv("Snapshot", &report.snapshot.snapshot_id.to_string());
    Output::kv("Embedding model", &report.snapshot.embedding_model);
    Output::kv("Dimension", &report.dimension.to_string());

    if !report.skipped.is_empty() {
        Output::warning(&format!("Skipped {} documents:", report.skipped.len()));
        for skipped in &report.skipped {
            Output::list_item(&format!("{}: {}", skipped.path.display(), skipped.reason));
        }
    }

    Ok(())
}
