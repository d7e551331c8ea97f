//! # LLM Client
//!
//! Provides the `Client` struct, the entry point for LLM interactions.
//! It resolves the provider from configuration and implements the domain traits
//! (`LlmProvider`, `Embedder`) on top of the provider functions.

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::traits::{Embedder, LlmProvider};
use crate::infrastructure::llm::providers::{self, ProviderConfig};
use crate::infrastructure::llm::{Context, Error, Provider, Response};

/// Simple LLM client
#[derive(Clone)]
pub struct Client {
    provider: Provider,
    config: ProviderConfig,
    temperature: f32,
}

impl Client {
    /// Create a new client from application configuration.
    /// Fails when the provider is unknown or no API key is available.
    pub fn new(app_config: &AppConfig) -> Result<Self, Error> {
        let provider = Provider::from_str(&app_config.llm.provider)
            .ok_or_else(|| Error::new(&app_config.llm.provider, "Unknown provider"))?;
        let config = ProviderConfig::from_app_config(app_config)?;
        Ok(Self {
            provider,
            config,
            temperature: app_config.llm.temperature,
        })
    }

    /// Send a full context to the provider
    pub async fn chat(&self, context: Context) -> Result<Response, Error> {
        providers::chat(self.provider, &self.config, context).await
    }

    /// Send a simple prompt with an optional temperature override
    pub async fn prompt(&self, prompt: &str, temperature: Option<f32>) -> Result<Response, Error> {
        let context = Context::prompt(prompt)
            .with_model(self.config.default_model.clone())
            .with_temperature(temperature.unwrap_or(self.temperature));
        self.chat(context).await
    }
}

#[async_trait]
impl LlmProvider for Client {
    async fn completion(&self, prompt: &str, temperature: Option<f32>) -> Result<String, String> {
        let response = self
            .prompt(prompt, temperature)
            .await
            .map_err(|e| e.to_string())?;
        tracing::debug!(
            "LLM response from {} ({} tokens)",
            response.model,
            response.usage.total_tokens
        );
        Ok(response.content)
    }

    fn model(&self) -> &str {
        &self.config.default_model
    }
}

#[async_trait]
impl Embedder for Client {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        providers::embed(self.provider, &self.config, text)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = AppConfig::default();
        config.llm.provider = "nope".to_string();
        config.llm.api_key = Some("k".to_string());
        let err = Client::new(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn test_client_reports_configured_model() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("k".to_string());
        config.llm.model = "gemini-1.5-pro".to_string();
        let client = Client::new(&config).unwrap();
        assert_eq!(LlmProvider::model(&client), "gemini-1.5-pro");
    }
}
