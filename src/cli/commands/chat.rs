//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ContextStrategy, Settings};
use crate::rag::{ConversationContext, QaEngine};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(strategy: Option<ContextStrategy>, mut settings: Settings) -> Result<()> {
    if let Some(strategy) = strategy {
        settings.retrieval.context_strategy = strategy;
    }

    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vedabot doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let engine = QaEngine::from_settings(&settings).await?;
    let mut context = ConversationContext::new();

    println!("\n{}", style("Vedabot Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about herbs, remedies and routines. Type 'clear' to reset, 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            context.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = engine.chat(&mut context, input).await;
        spinner.finish_and_clear();

        match result {
            Ok(result) => {
                println!("\n{} {}\n", style("Vedabot:").cyan().bold(), result.result);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
