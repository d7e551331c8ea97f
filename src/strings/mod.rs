//! # Strings Module
//!
//! Centralizes user-facing strings, prompts, templates and help text.

pub mod help;
pub mod logs;
pub mod messages;
pub mod prompts;
pub mod templates;
