//! # LLM Providers
//!
//! Provider-specific request code. Gemini is the only backend; the dispatch keeps the
//! provider seam so the client stays provider-agnostic.

mod gemini;

use crate::domain::config::AppConfig;
use crate::infrastructure::llm::{Context, Error, Provider, Response};

/// Configuration for a provider
#[derive(Clone)]
pub struct ProviderConfig {
    /// API key
    pub api_key: String,
    /// Base URL (for non-default endpoints)
    pub base_url: Option<String>,
    /// Default model
    pub default_model: String,
    /// Model used for embeddings
    pub embedding_model: String,
    /// Timeout in seconds
    pub timeout: u64,
}

impl ProviderConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let api_key = config.api_key().ok_or_else(|| {
            Error::new(
                &config.llm.provider,
                format!(
                    "No API key provided - set llm.api_key or {}",
                    config.llm.api_key_env
                ),
            )
        })?;

        Ok(Self {
            api_key,
            base_url: config.llm.endpoint.clone(),
            default_model: config.llm.model.clone(),
            embedding_model: config.llm.embedding_model.clone(),
            timeout: config.llm.timeout,
        })
    }
}

/// Execute a chat request with the specified provider
pub async fn chat(
    provider: Provider,
    config: &ProviderConfig,
    context: Context,
) -> Result<Response, Error> {
    match provider {
        Provider::Gemini => gemini::chat(config, context).await,
    }
}

/// Embed a single text with the specified provider
pub async fn embed(provider: Provider, config: &ProviderConfig, text: &str) -> Result<Vec<f32>, Error> {
    match provider {
        Provider::Gemini => gemini::embed(config, text).await,
    }
}
