//! Configuration settings for Vedabot.

use crate::error::{Result, VedabotError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub index: IndexSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub retrieval: RetrievalSettings,
    pub ingest: IngestSettings,
}

/// Source document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Directory holding the source documents.
    pub path: String,
    /// Descend into subdirectories when enumerating documents.
    pub recursive: bool,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            path: "~/.vedabot/data".to_string(),
            recursive: false,
        }
    }
}

/// Vector index storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Path of the persisted index snapshot.
    pub path: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: "~/.vedabot/vectorstore/index.db".to_string(),
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings` endpoint.
    #[default]
    OpenAI,
    /// Offline feature-hashing embedder.
    Hashing,
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Hashing => write!(f, "hashing"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, hashing).
    pub provider: EmbeddingProvider,
    /// Embedding model identifier.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Send `dimensions` in the request (only some models accept it).
    pub request_dimensions: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            api_base: "https://router.huggingface.co/v1".to_string(),
            request_dimensions: false,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Generation model identifier.
    pub model: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-call deadline for the generation request.
    pub timeout_seconds: u64,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            max_tokens: 1024,
            temperature: 0.1,
            timeout_seconds: 60,
            api_base: "https://router.huggingface.co/v1".to_string(),
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// How prior conversation turns are folded into the next query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextStrategy {
    /// Every turn's text, space-joined in order.
    #[default]
    Concatenate,
    /// Only the most recent user turn.
    Latest,
    /// Only the last `context_window` turns, space-joined.
    Window,
}

impl std::str::FromStr for ContextStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concatenate" | "concat" => Ok(ContextStrategy::Concatenate),
            "latest" => Ok(ContextStrategy::Latest),
            "window" => Ok(ContextStrategy::Window),
            _ => Err(format!("Unknown context strategy: {}", s)),
        }
    }
}

/// Retrieval and answer assembly settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of passages retrieved per query.
    pub k: usize,
    /// Append a references section to the answer text.
    pub append_references: bool,
    /// Maximum characters of passage text shown in a citation.
    pub citation_excerpt_chars: usize,
    /// Multi-turn context rendering strategy.
    pub context_strategy: ContextStrategy,
    /// Number of turns kept by the `window` strategy.
    pub context_window: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: 2,
            append_references: true,
            citation_excerpt_chars: 300,
            context_strategy: ContextStrategy::Concatenate,
            context_window: 6,
        }
    }
}

/// Ingestion pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Maximum documents extracted concurrently.
    pub max_concurrent_documents: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 4,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| VedabotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that the settings describe a usable pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(VedabotError::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(VedabotError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.k == 0 {
            return Err(VedabotError::Config("retrieval.k must be positive".to_string()));
        }
        if self.embedding.dimensions == 0 {
            return Err(VedabotError::Config("embedding.dimensions must be positive".to_string()));
        }
        if self.generation.timeout_seconds == 0 {
            return Err(VedabotError::Config(
                "generation.timeout_seconds must be positive".to_string(),
            ));
        }
        for (key, value) in [
            ("embedding.api_base", &self.embedding.api_base),
            ("generation.api_base", &self.generation.api_base),
        ] {
            url::Url::parse(value)
                .map_err(|e| VedabotError::Config(format!("{} is not a valid URL: {}", key, e)))?;
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vedabot")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded corpus directory path.
    pub fn corpus_dir(&self) -> PathBuf {
        Self::expand_path(&self.corpus.path)
    }

    /// Get the expanded index snapshot path.
    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.index.path)
    }
}
