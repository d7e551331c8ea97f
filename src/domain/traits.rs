//! # Domain Traits
//!
//! Abstract interfaces for the pluggable parts (LLM, embeddings, console input, consent).
//! Allows the Gemini client and the console to be swapped for fakes in tests.

use anyhow::Result;
use async_trait::async_trait;

/// Abstract interface for an LLM Provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion. `temperature` overrides the provider default when set.
    async fn completion(&self, prompt: &str, temperature: Option<f32>) -> Result<String, String>;

    /// Name of the model answering requests
    fn model(&self) -> &str;
}

/// Turns text into an embedding vector for long-term memory
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String>;
}

/// Interactive question/answer source used by the console flows
pub trait Prompter: Send {
    /// Ask a free-form question. An empty answer yields `default` when one is given.
    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String>;

    /// Yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        let answer = self.ask(&format!("{question} ({hint})"), None)?;
        Ok(match answer.trim().to_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }

    /// Pick one of `options`; re-asks until the answer matches.
    fn choose(&mut self, question: &str, options: &[&str], default: &str) -> Result<String> {
        loop {
            let prompt = format!("{question} [{}]", options.join("/"));
            let answer = self.ask(&prompt, Some(default))?;
            let answer = answer.trim().to_lowercase();
            if let Some(option) = options.iter().find(|o| o.to_lowercase() == answer) {
                return Ok(option.to_string());
            }
            tracing::debug!("Invalid choice '{}', expected one of {:?}", answer, options);
        }
    }
}

/// Consent gate for tools that write several files at once
pub trait Approver: Send + Sync {
    fn approve(&self, summary: &str) -> bool;
}
