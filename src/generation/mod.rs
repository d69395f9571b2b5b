//! Answer generation through a hosted large language model.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate free text for a fully rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Identifier of the underlying model.
    fn model_id(&self) -> &str;
}
