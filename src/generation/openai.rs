//! Chat-completions generator for OpenAI-compatible endpoints.

use super::Generator;
use crate::config::GenerationSettings;
use crate::error::{Result, VedabotError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Generator backed by a hosted instruction-tuned model.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIGenerator {
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        Ok(Self {
            // the engine enforces the real deadline; this only stops a hung socket
            client: create_client_with_timeout(&settings.api_base, settings.timeout() * 2)?,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| VedabotError::ProviderUnavailable(e.to_string()))?
                .into(),
        ];

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| VedabotError::ProviderUnavailable(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            VedabotError::ProviderUnavailable(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VedabotError::ProviderUnavailable("Empty response from model".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
