//! RAG (Retrieval-Augmented Generation) question answering with sources.
//!
//! Retrieves the passages closest to a question, asks the language model to
//! answer from them, and attaches numbered citations to the answer.

pub mod citation;
mod conversation;
mod engine;

pub use citation::{add_sources_to_answer, format_citation};
pub use conversation::{ConversationContext, Role, Turn};
pub use engine::{handle_query, QaEngine, QueryState};

use crate::vector_store::Passage;
use serde::{Deserialize, Serialize};

/// Answer shown whenever a query cannot be completed.
pub const FALLBACK_ANSWER: &str =
    "I apologize, but I encountered an error processing your question. Please try again.";

/// Outcome of a question-answering request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Answer text, with references appended when enabled.
    pub result: String,
    /// Passages the answer was grounded on, in retrieval order.
    pub source_documents: Vec<Passage>,
}

impl QueryResult {
    /// The fixed apology with no sources.
    pub fn fallback() -> Self {
        Self {
            result: FALLBACK_ANSWER.to_string(),
            source_documents: Vec::new(),
        }
    }

    /// Whether this is the fallback answer.
    pub fn is_fallback(&self) -> bool {
        self.result == FALLBACK_ANSWER && self.source_documents.is_empty()
    }
}
