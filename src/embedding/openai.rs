//! Embeddings from an OpenAI-compatible endpoint.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, VedabotError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Texts sent per embeddings request.
const BATCH_SIZE: usize = 100;

/// Embedder backed by a hosted model.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    request_dimensions: bool,
}

impl OpenAIEmbedder {
    /// Create an embedder for the given API base, model and dimensions.
    pub fn with_config(api_base: &str, model: &str, dimensions: usize) -> Result<Self> {
        Ok(Self {
            client: create_client(api_base)?,
            model: model.to_string(),
            dimensions,
            request_dimensions: false,
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let mut embedder =
            Self::with_config(&settings.api_base, &settings.model, settings.dimensions)?;
        embedder.request_dimensions = settings.request_dimensions;
        Ok(embedder)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VedabotError::ProviderUnavailable("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let mut args = CreateEmbeddingRequestArgs::default();
            args.model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()));
            if self.request_dimensions {
                args.dimensions(self.dimensions as u32);
            }
            let request = args
                .build()
                .map_err(|e| VedabotError::ProviderUnavailable(format!("Failed to build request: {}", e)))?;

            let response = self.client.embeddings().create(request).await.map_err(|e| {
                VedabotError::ProviderUnavailable(format!("Embedding API error: {}", e))
            })?;

            if response.data.len() != chunk.len() {
                return Err(VedabotError::ProviderUnavailable(format!(
                    "Requested {} embeddings, received {}",
                    chunk.len(),
                    response.data.len()
                )));
            }

            // Sort by index to ensure correct order
            let mut embeddings: Vec<_> = response.data.into_iter().collect();
            embeddings.sort_by_key(|e| e.index);

            for embedding_data in embeddings {
                if embedding_data.embedding.len() != self.dimensions {
                    return Err(VedabotError::DimensionMismatch {
                        expected: self.dimensions,
                        actual: embedding_data.embedding.len(),
                    });
                }
                all_embeddings.push(embedding_data.embedding);
            }
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
