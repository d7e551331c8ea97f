//! # Infrastructure Layer
//!
//! Handles interactions with external systems: the Gemini API, public web endpoints,
//! and child processes. Implements the traits defined in the Domain layer.

pub mod llm;
pub mod tools;
pub mod web;
