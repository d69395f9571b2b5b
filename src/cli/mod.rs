//! CLI module for Vedabot.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::ContextStrategy;
use clap::{Parser, Subcommand};

/// Vedabot - Ayurvedic question answering over your own documents
///
/// Indexes a folder of PDFs and text files, then answers health questions
/// from them with numbered references.
#[derive(Parser, Debug)]
#[command(name = "vedabot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VEDABOT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the vector index from the document corpus
    Ingest {
        /// Directory of source documents (defaults to corpus.path)
        #[arg(short, long)]
        source: Option<String>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// Number of passages to retrieve
        #[arg(short, long)]
        k: Option<usize>,

        /// Omit the reference list from the answer
        #[arg(long)]
        no_references: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// How earlier turns feed retrieval (concatenate, latest, window)
        #[arg(long)]
        strategy: Option<ContextStrategy>,
    },

    /// Show the passages retrieved for a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Check credentials, corpus, index and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
