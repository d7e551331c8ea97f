//! # LLM Infrastructure
//!
//! Thin wrapper over the Gemini REST API: chat completions for the agent and writers,
//! embeddings for long-term memory.

pub mod client;
pub mod providers;
mod types;

pub use client::Client;
pub use types::*;
