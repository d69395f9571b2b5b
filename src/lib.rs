//! Vedabot - Ayurvedic question answering with references
//!
//! A retrieval-augmented assistant that answers health questions from a
//! corpus of Ayurvedic documents and cites the passages it used.
//!
//! # Overview
//!
//! Vedabot allows you to:
//! - Index a folder of PDFs and text files into a vector snapshot
//! - Ask questions and get answers grounded in the indexed passages
//! - Hold a multi-turn conversation over the same corpus
//! - Serve the question-answering boundary over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and the fixed prompt template
//! - `loader` - Document discovery and text extraction
//! - `chunking` - Overlapping passage splitting
//! - `embedding` - Embedding providers
//! - `vector_store` - In-memory index and its SQLite snapshot
//! - `indexer` - The ingestion pipeline
//! - `generation` - Answer generation providers
//! - `rag` - Retrieval-QA engine, citations and conversation context
//!
//! # Example
//!
//! ```rust,no_run
//! use vedabot::config::Settings;
//! use vedabot::indexer::Indexer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!
//!     let report = Indexer::new(&settings)?
//!         .build_index(&settings.corpus_dir())
//!         .await?;
//!     println!("Indexed {} passages", report.passages_indexed);
//!
//!     let answer = vedabot::handle_query(&settings, "What are the benefits of Ginger?").await;
//!     println!("{}", answer.result);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod indexer;
pub mod loader;
pub mod openai;
pub mod rag;
pub mod vector_store;

pub use error::{Result, VedabotError};
pub use rag::{handle_query, QueryResult};
