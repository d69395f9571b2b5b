//! Client construction for OpenAI-compatible model endpoints.
//!
//! Both the embedding and the generation providers talk to hosted models
//! through the OpenAI wire format, so the same client setup serves either.

use crate::error::{Result, VedabotError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for model API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variables consulted for the access credential, in order.
pub const API_KEY_VARS: &[&str] = &["VEDABOT_API_KEY", "HUGGINGFACEHUB_API_TOKEN", "OPENAI_API_KEY"];

/// Read the access credential from the environment.
///
/// Returns `None` when no variable is set or all are empty.
pub fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|key| !key.trim().is_empty())
}

/// Create a client for the given API base with the default timeout.
pub fn create_client(api_base: &str) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(api_base, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client for the given API base with a custom timeout.
pub fn create_client_with_timeout(api_base: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VedabotError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new().with_api_base(api_base.trim_end_matches('/'));
    if let Some(key) = api_key_from_env() {
        config = config.with_api_key(key);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
