//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::QaEngine;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    k: Option<usize>,
    no_references: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vedabot doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut engine = QaEngine::from_settings(&settings).await?;
    if let Some(k) = k {
        engine = engine.with_k(k);
    }
    if no_references {
        engine = engine.with_references(false);
    }

    let spinner = Output::spinner("Consulting the texts...");
    let result = engine.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            println!("\n{}\n", result.result);
            if result.is_fallback() {
                Output::warning("The answer could not be generated. Run with -v for details.");
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
