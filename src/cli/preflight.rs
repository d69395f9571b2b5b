//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and the index are available before starting
//! operations that would otherwise fail midway or only fall back.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{Result, VedabotError};
use crate::openai::{api_key_from_env, API_KEY_VARS};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion needs a credential when embeddings are hosted.
    Ingest,
    /// Answering needs the credential and a built index.
    Ask,
    /// Search needs a built index, and a credential for hosted embeddings.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    let hosted_embeddings = settings.embedding.provider == EmbeddingProvider::OpenAI;
    match operation {
        Operation::Ingest => {
            if hosted_embeddings {
                check_api_key()?;
            }
        }
        Operation::Ask => {
            check_api_key()?;
            check_index(settings)?;
        }
        Operation::Search => {
            if hosted_embeddings {
                check_api_key()?;
            }
            check_index(settings)?;
        }
    }
    Ok(())
}

/// Check that a model endpoint credential is set.
fn check_api_key() -> Result<()> {
    if api_key_from_env().is_some() {
        return Ok(());
    }
    Err(VedabotError::Config(format!(
        "No API key found. Set one of: {}",
        API_KEY_VARS.join(", ")
    )))
}

fn check_index(settings: &Settings) -> Result<()> {
    let path = settings.index_path();
    if path.exists() {
        Ok(())
    } else {
        Err(VedabotError::IndexUnavailable(format!(
            "No index at {}. Run `vedabot ingest` first.",
            path.display()
        )))
    }
}
