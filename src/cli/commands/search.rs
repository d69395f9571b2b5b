//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::QaEngine;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let engine = QaEngine::from_settings(&settings).await?;

    let spinner = Output::spinner("Searching...");
    let results = engine.retrieve(query, limit.max(1)).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No passages found.");
            } else {
                Output::success(&format!("Found {} passages", results.len()));
                for (i, result) in results.iter().enumerate() {
                    Output::search_result(i + 1, result);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
