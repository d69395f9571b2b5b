//! Configuration module for Vedabot.
//!
//! Handles loading application settings and holds the fixed prompt template.

pub mod prompts;
mod settings;

pub use prompts::{build_prompt, QA_PROMPT_TEMPLATE};
pub use settings::{
    ChunkingSettings, ContextStrategy, CorpusSettings, EmbeddingProvider, EmbeddingSettings,
    GenerationSettings, IndexSettings, IngestSettings, RetrievalSettings, Settings,
};
