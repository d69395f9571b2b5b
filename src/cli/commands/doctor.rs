//! Doctor command - verify credentials, corpus, index and configuration.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use crate::embedding::create_embedder;
use crate::loader::discover_documents;
use crate::openai::API_KEY_VARS;
use crate::vector_store::read_snapshot_info;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Vedabot Doctor");
    println!();

    let sections: [(&str, Vec<CheckResult>); 4] = [
        ("API Configuration", vec![check_api_key(settings)]),
        ("Corpus", vec![check_corpus(settings)]),
        ("Index", vec![check_index(settings)]),
        ("Configuration", check_config(settings, config_path)),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                CheckStatus::Error => errors += 1,
                CheckStatus::Warning => warnings += 1,
                CheckStatus::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        Output::error(&format!("{} error(s) found.", errors));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Vedabot is ready to use.");
    }

    Ok(())
}

/// Report which credential variable is set, never its value.
fn check_api_key(settings: &Settings) -> CheckResult {
    let found = API_KEY_VARS
        .iter()
        .find(|var| std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false));

    match found {
        Some(var) => CheckResult::ok("API key", &format!("found in {}", var)),
        _ if settings.embedding.provider == EmbeddingProvider::Hashing => CheckResult::warning(
            "API key",
            "not set",
            &format!("Needed for answers. Set one of: {}", API_KEY_VARS.join(", ")),
        ),
        _ => CheckResult::error(
            "API key",
            "not set",
            &format!("Set one of: {}", API_KEY_VARS.join(", ")),
        ),
    }
}

fn check_corpus(settings: &Settings) -> CheckResult {
    let dir = settings.corpus_dir();
    match discover_documents(&dir, settings.corpus.recursive) {
        Ok(docs) if docs.is_empty() => CheckResult::warning(
            "Corpus",
            &format!("{} has no PDF or text files", dir.display()),
            "Add documents before running `vedabot ingest`",
        ),
        Ok(docs) => CheckResult::ok(
            "Corpus",
            &format!("{} ({} documents)", dir.display(), docs.len()),
        ),
        Err(_) => CheckResult::warning(
            "Corpus",
            &format!("{} not found", dir.display()),
            "Create it or set corpus.path in the config",
        ),
    }
}

fn check_index(settings: &Settings) -> CheckResult {
    let path = settings.index_path();
    if !path.exists() {
        return CheckResult::warning(
            "Index",
            &format!("{} (not built yet)", path.display()),
            "Build it with: vedabot ingest",
        );
    }

    let info = match read_snapshot_info(&path) {
        Ok(info) => info,
        Err(e) => {
            return CheckResult::error(
                "Index",
                &format!("{} is unreadable: {}", path.display(), e),
                "Rebuild it with: vedabot ingest",
            )
        }
    };

    let expected = match create_embedder(&settings.embedding) {
        Ok(embedder) => Some((embedder.model_id().to_string(), embedder.dimensions())),
        Err(_) => None,
    };

    let summary = format!(
        "{} passages, {} dims, {}, built {}",
        info.passage_count,
        info.dimension,
        info.embedding_model,
        info.created_at.format("%Y-%m-%d %H:%M")
    );

    match expected {
        Some((model, dimension)) if model != info.embedding_model || dimension != info.dimension => {
            CheckResult::error(
                "Index",
                &format!("{} (configured for {}, {} dims)", summary, model, dimension),
                "Re-run `vedabot ingest` after changing embedding settings",
            )
        }
        _ => CheckResult::ok("Index", &summary),
    }
}

fn check_config(settings: &Settings, config_path: &Path) -> Vec<CheckResult> {
    let file = if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vedabot config init",
        )
    };

    let validity = match settings.validate() {
        Ok(()) => CheckResult::ok("Settings", "valid"),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix the config file"),
    };

    vec![file, validity]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_missing_index_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.index.path = dir.path().join("index.db").to_string_lossy().into_owned();

        assert_eq!(check_index(&settings).status, CheckStatus::Warning);
    }

    #[test]
    fn test_garbage_index_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        std::fs::write(&path, b"not sqlite").unwrap();
        let mut settings = Settings::default();
        settings.index.path = path.to_string_lossy().into_owned();

        assert_eq!(check_index(&settings).status, CheckStatus::Error);
    }

    #[test]
    fn test_corpus_counts_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let mut settings = Settings::default();
        settings.corpus.path = dir.path().to_string_lossy().into_owned();

        let result = check_corpus(&settings);
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("1 documents"));
    }
}
